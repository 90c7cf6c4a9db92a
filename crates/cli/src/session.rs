use anyhow::{anyhow, bail, Context, Result};
use container::Container;
use dataset::{AttrValue, StreamDataset};
use sources::{SourceAdapter, UniformSource, WcupSource};
use std::str::FromStr;

/// Default number of records printed by `HEAD`.
const HEAD_DEFAULT: usize = 10;

/// What the shell should do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Print this text (nothing if empty) and read the next command.
    Output(String),
    Exit,
}

/// Executes shell commands against one container.
pub struct Session {
    container: Container,
}

impl Session {
    pub fn new(container: Container) -> Self {
        Self { container }
    }

    /// Runs one command line. Failures are rendered as `ERR ...` lines.
    pub fn execute(&self, line: &str) -> Step {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some((cmd, args)) = parts.split_first() else {
            return Step::Output(String::new());
        };

        let result = match cmd.to_uppercase().as_str() {
            "EXIT" | "QUIT" => return Step::Exit,
            "IMPORT" => self.import(args),
            "GEN" => self.generate(args),
            "LIST" => self.list(),
            "INFO" => self.info(args),
            "HEAD" => self.head(args),
            "DROP" => self.drop_entry(args),
            "COPY" => self.copy(args),
            "HASH_STREAMS" => self.update(args, 1, |ds, a| {
                ds.hash_streams(parse(a[0], "modulus")?)?;
                Ok(())
            }),
            "HASH_SOURCES" => self.update(args, 1, |ds, a| {
                ds.hash_sources(parse(a[0], "modulus")?)?;
                Ok(())
            }),
            "NEGATE" => self.update(args, 0, |ds, _| {
                ds.negate();
                Ok(())
            }),
            "SHIFT" => self.update(args, 1, |ds, a| {
                ds.time_shift(parse(a[0], "dt")?)?;
                Ok(())
            }),
            "WINDOW" => self.update(args, 1, |ds, a| {
                ds.time_window(parse(a[0], "tw")?)?;
                Ok(())
            }),
            "ANNOTATE" => self.update(args, 2, |ds, a| {
                ds.annotate(a[0], AttrValue::parse(a[1]))?;
                Ok(())
            }),
            "MERGE" => self.merge(args),
            "SLICE" => self.slice(args),
            other => Err(anyhow!("unknown command: {}", other)),
        };

        match result {
            Ok(text) => Step::Output(text),
            Err(e) => Step::Output(format!("ERR {:#}", e)),
        }
    }

    fn store(&self, ds: &StreamDataset, name: &str) -> Result<String> {
        self.container
            .write(ds, name)
            .with_context(|| format!("writing '{}'", name))?;
        Ok(format!("OK ({} records)", ds.len()))
    }

    fn load(&self, name: &str) -> Result<StreamDataset> {
        self.container
            .read(name)
            .with_context(|| format!("reading '{}'", name))
    }

    /// Loads `args[0]`, applies `f` to it with the remaining `nargs`
    /// arguments and writes it back under the same name.
    fn update<F>(&self, args: &[&str], nargs: usize, f: F) -> Result<String>
    where
        F: FnOnce(&mut StreamDataset, &[&str]) -> Result<()>,
    {
        let Some((name, rest)) = args.split_first() else {
            bail!("usage: missing entry name");
        };
        if rest.len() != nargs {
            bail!("usage: expected {} argument(s) after the entry name", nargs);
        }
        let mut ds = self.load(name)?;
        f(&mut ds, rest)?;
        self.store(&ds, name)
    }

    fn import(&self, args: &[&str]) -> Result<String> {
        match args {
            [kind, path, name, fields @ ..] if kind.eq_ignore_ascii_case("WCUP") && fields.len() <= 2 => {
                let mut source = WcupSource::new(*path);
                if let Some(sid) = fields.first() {
                    source.sid_field = sid.parse()?;
                }
                if let Some(key) = fields.get(1) {
                    source.key_field = key.parse()?;
                }
                let ds = source
                    .load()
                    .with_context(|| format!("importing {}", path))?;
                self.store(&ds, name)
            }
            _ => bail!("usage: IMPORT WCUP path name [sid_field] [key_field]"),
        }
    }

    fn generate(&self, args: &[&str]) -> Result<String> {
        let (name, seed) = match args.len() {
            5 => (args[0], 0),
            6 => (args[0], parse(args[5], "seed")?),
            _ => bail!("usage: GEN name max_sid max_hid max_key max_time [seed]"),
        };
        let source = UniformSource::new(
            parse(args[1], "max_sid")?,
            parse(args[2], "max_hid")?,
            parse(args[3], "max_key")?,
            parse(args[4], "max_time")?,
            seed,
        );
        let ds = source.load()?;
        self.store(&ds, name)
    }

    fn list(&self) -> Result<String> {
        let names = self.container.names()?;
        if names.is_empty() {
            return Ok("(empty)".to_string());
        }
        Ok(format!("{}\n({} entries)", names.join("\n"), names.len()))
    }

    fn info(&self, args: &[&str]) -> Result<String> {
        let [name] = args else {
            bail!("usage: INFO name");
        };
        let ds = self.load(name)?;
        let mut lines = vec![ds.to_string(), ds.metadata().to_string()];
        for (attr, value) in ds.annotations() {
            lines.push(format!("{} = {}", attr, value));
        }
        Ok(lines.join("\n"))
    }

    fn head(&self, args: &[&str]) -> Result<String> {
        let (name, n) = match args {
            [name] => (*name, HEAD_DEFAULT),
            [name, n] => (*name, parse(n, "n")?),
            _ => bail!("usage: HEAD name [n]"),
        };
        let ds = self.load(name)?;
        let lines: Vec<String> = ds.iter().take(n).map(|r| r.to_string()).collect();
        Ok(lines.join("\n"))
    }

    fn drop_entry(&self, args: &[&str]) -> Result<String> {
        let [name] = args else {
            bail!("usage: DROP name");
        };
        self.container.remove(name)?;
        Ok("OK".to_string())
    }

    fn copy(&self, args: &[&str]) -> Result<String> {
        let [src, dst] = args else {
            bail!("usage: COPY src dst");
        };
        let ds = self.load(src)?;
        self.store(&ds, dst)
    }

    fn merge(&self, args: &[&str]) -> Result<String> {
        let Some((dst, srcs)) = args.split_first() else {
            bail!("usage: MERGE dst src...");
        };
        if srcs.is_empty() {
            bail!("usage: MERGE dst src...");
        }
        let mut ds = self.load(dst)?;
        let others = srcs
            .iter()
            .map(|name| self.load(name))
            .collect::<Result<Vec<_>>>()?;
        let refs: Vec<&StreamDataset> = others.iter().collect();
        ds.merge_many(&refs);
        self.store(&ds, dst)
    }

    fn slice(&self, args: &[&str]) -> Result<String> {
        let [src, dst, from, to] = args else {
            bail!("usage: SLICE src dst from_dt to_dt");
        };
        let ds = self.load(src)?;
        let part = ds.window(parse(from, "from_dt")?, parse(to, "to_dt")?)?;
        self.store(&part, dst)
    }
}

fn parse<T: FromStr>(s: &str, what: &str) -> Result<T> {
    s.parse()
        .map_err(|_| anyhow!("invalid {}: '{}'", what, s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn session() -> (tempfile::TempDir, Session) {
        let dir = tempdir().unwrap();
        let container = Container::open(dir.path().join("dds")).unwrap();
        (dir, Session::new(container))
    }

    fn out(s: &Session, line: &str) -> String {
        match s.execute(line) {
            Step::Output(text) => text,
            Step::Exit => panic!("unexpected exit on {:?}", line),
        }
    }

    #[test]
    fn gen_info_head() {
        let (_dir, s) = session();
        assert_eq!(out(&s, "GEN u 4 2 100 50 7"), "OK (50 records)");

        let info = out(&s, "INFO u");
        assert!(info.starts_with("<StreamDataset of length 50>"));
        assert!(info.contains("ts_range=[1, 50]"));
        assert!(info.contains("origin = \"uniform\""), "{}", info);

        let head = out(&s, "HEAD u 3");
        assert_eq!(head.lines().count(), 3);
        assert!(head.contains("ts=1"));
    }

    #[test]
    fn transforms_write_back() {
        let (_dir, s) = session();
        out(&s, "GEN u 8 8 100 20 1");
        assert_eq!(out(&s, "HASH_STREAMS u 2"), "OK (20 records)");
        assert_eq!(out(&s, "HASH_SOURCES u 1"), "OK (20 records)");
        assert_eq!(out(&s, "SHIFT u 100"), "OK (20 records)");
        assert_eq!(out(&s, "NEGATE u"), "OK (20 records)");
        assert_eq!(out(&s, "WINDOW u 5"), "OK (40 records)");

        let info = out(&s, "INFO u");
        assert!(info.contains("ts_range=[101, 125]"), "{}", info);
        assert!(info.contains("sources={0}"), "{}", info);
    }

    #[test]
    fn merge_copy_slice_and_drop() {
        let (_dir, s) = session();
        out(&s, "GEN a 2 2 10 30 1");
        out(&s, "GEN b 2 2 10 30 2");
        assert_eq!(out(&s, "COPY a c"), "OK (30 records)");
        assert_eq!(out(&s, "MERGE c b a"), "OK (90 records)");
        assert_eq!(out(&s, "SLICE c d 0 10"), "OK (30 records)");
        assert_eq!(out(&s, "LIST"), "a\nb\nc\nd\n(4 entries)");

        assert_eq!(out(&s, "DROP d"), "OK");
        assert!(out(&s, "INFO d").starts_with("ERR"));
    }

    #[test]
    fn annotate_parses_values() {
        let (_dir, s) = session();
        out(&s, "GEN u 1 1 1 5");
        assert_eq!(out(&s, "ANNOTATE u window 3600"), "OK (5 records)");
        let info = out(&s, "INFO u");
        assert!(info.contains("window = 3600"));
        assert!(out(&s, "ANNOTATE u ts_range 1").starts_with("ERR"));
    }

    #[test]
    fn errors_are_reported_not_fatal() {
        let (_dir, s) = session();
        assert!(out(&s, "INFO missing").contains("entry not found"));
        assert!(out(&s, "SHIFT").starts_with("ERR usage"));
        assert!(out(&s, "GEN u 1 1 1 x").contains("invalid max_time"));
        out(&s, "GEN u 1 1 1 5");
        assert!(out(&s, "HASH_STREAMS u 0").starts_with("ERR"));
        assert!(out(&s, "FROB").contains("unknown command"));
        assert_eq!(out(&s, "LIST"), "u\n(1 entries)");
    }

    #[test]
    fn blank_line_and_exit() {
        let (_dir, s) = session();
        assert_eq!(s.execute("   "), Step::Output(String::new()));
        assert_eq!(s.execute("quit"), Step::Exit);
        assert_eq!(s.execute("EXIT"), Step::Exit);
    }
}
