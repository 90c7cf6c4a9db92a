mod helpers;
mod transform_tests;
