use crate::cli::parser::Commands;
use crate::config::Config;
use crate::errors::AppResult;
use crate::ui::messages::info;
use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::thread;
use std::time::Duration;

const FOLLOW_INTERVAL: Duration = Duration::from_millis(500);

/// Handle the `logs` subcommand
pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Logs { follow, lines } = cmd {
        let path = cfg.log_file();
        if !path.exists() {
            info(format!("No background tracker log at {}", path.display()));
            return Ok(());
        }

        println!("Log file: {}", path.display());
        let content = fs::read_to_string(&path)?;
        for line in tail(&content, *lines) {
            println!("{}", line);
        }

        if *follow {
            follow_file(&path, content.len() as u64)?;
        }
    }
    Ok(())
}

fn tail(content: &str, n: usize) -> Vec<&str> {
    let all: Vec<&str> = content.lines().collect();
    all[all.len().saturating_sub(n)..].to_vec()
}

/// Print appended data until interrupted.
fn follow_file(path: &Path, mut pos: u64) -> AppResult<()> {
    loop {
        thread::sleep(FOLLOW_INTERVAL);

        let len = match fs::metadata(path) {
            Ok(m) => m.len(),
            Err(_) => continue,
        };
        if len < pos {
            // truncated or recreated
            pos = 0;
        }
        if len == pos {
            continue;
        }

        let mut file = File::open(path)?;
        file.seek(SeekFrom::Start(pos))?;
        let mut buf = String::new();
        file.read_to_string(&mut buf)?;
        pos += buf.len() as u64;
        print!("{}", buf);
        io::stdout().flush()?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_keeps_last_lines() {
        assert_eq!(tail("a\nb\nc\n", 2), vec!["b", "c"]);
        assert_eq!(tail("a\nb\n", 10), vec!["a", "b"]);
        assert!(tail("", 5).is_empty());
    }
}
