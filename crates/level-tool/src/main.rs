//! Create, inspect, and edit level directories.
//!
//! Commands:
//! - `info [dir]` - Print the level's metadata
//! - `create <dir> <name> [seed] [generator] [options]` - Write a new level
//! - `set-time <dir> <ticks>` - Set elapsed world time
//! - `set-spawn <dir> <x> <y> <z>` - Set the spawn point
//!
//! `LEVEL_DIR` is used when `info` gets no directory; `LEVEL_COMPRESSION`
//! sets the gzip level for anything written.

use std::path::PathBuf;

use eyre::{WrapErr, bail, eyre};
use level_format::{BuiltinGenerators, LevelConfig, LevelData, LevelSettings};
use tracing::info;

/// A parsed command line
#[derive(Debug, PartialEq)]
enum Command {
    Info {
        dir: Option<PathBuf>,
    },
    Create {
        dir: PathBuf,
        name: String,
        seed: Option<i64>,
        generator: Option<String>,
        options: Option<String>,
    },
    SetTime {
        dir: PathBuf,
        ticks: i64,
    },
    SetSpawn {
        dir: PathBuf,
        pos: (i32, i32, i32),
    },
}

const USAGE: &str = "usage: level-tool <info [dir] | create <dir> <name> [seed] [generator] [options] | set-time <dir> <ticks> | set-spawn <dir> <x> <y> <z>>";

fn parse_args(args: &[String]) -> eyre::Result<Command> {
    let arg = |i: usize, what: &str| {
        args.get(i)
            .cloned()
            .ok_or_else(|| eyre!("missing {what}\n{USAGE}"))
    };
    let number = |i: usize, what: &str| -> eyre::Result<i64> {
        arg(i, what)?
            .parse()
            .wrap_err_with(|| format!("{what} must be an integer"))
    };
    let coord = |i: usize, what: &str| -> eyre::Result<i32> {
        arg(i, what)?
            .parse()
            .wrap_err_with(|| format!("{what} must be a 32-bit integer"))
    };

    let Some(command) = args.first() else {
        bail!(USAGE);
    };

    let command = match command.as_str() {
        "info" => Command::Info {
            dir: args.get(1).map(PathBuf::from),
        },
        "create" => Command::Create {
            dir: arg(1, "directory")?.into(),
            name: arg(2, "name")?,
            seed: args.get(3).map(|_| number(3, "seed")).transpose()?,
            generator: args.get(4).cloned(),
            options: args.get(5).cloned(),
        },
        "set-time" => Command::SetTime {
            dir: arg(1, "directory")?.into(),
            ticks: number(2, "ticks")?,
        },
        "set-spawn" => Command::SetSpawn {
            dir: arg(1, "directory")?.into(),
            pos: (coord(2, "x")?, coord(3, "y")?, coord(4, "z")?),
        },
        other => bail!("unknown command {other:?}\n{USAGE}"),
    };
    Ok(command)
}

fn config_for(dir: Option<PathBuf>) -> LevelConfig {
    let config = LevelConfig::from_env();
    match dir {
        Some(dir) => LevelConfig {
            dir,
            ..config
        },
        None => config,
    }
}

#[allow(clippy::print_stdout)]
fn print_info(level: &LevelData) {
    let show = |r: level_format::LevelResult<String>| r.unwrap_or_else(|e| format!("<{e}>"));

    println!("path:      {}", level.path().display());
    println!("name:      {}", show(level.name().map(str::to_string)));
    println!("seed:      {}", show(level.seed().map(|s| s.to_string())));
    println!("time:      {}", level.time());
    println!("spawn:     {}", show(level.spawn().map(|p| p.to_string())));
    println!(
        "generator: {} {:?}",
        show(level.generator_name().map(str::to_string)),
        show(level.generator_options().map(str::to_string))
    );
}

fn run(command: Command) -> eyre::Result<()> {
    let registry = BuiltinGenerators::new();

    match command {
        Command::Info { dir } => {
            let config = config_for(dir);
            let level = LevelData::load(&config, &registry)
                .wrap_err_with(|| format!("failed to open {}", config.dir.display()))?;
            print_info(&level);
        }
        Command::Create {
            dir,
            name,
            seed,
            generator,
            options,
        } => {
            let config = config_for(Some(dir));
            let mut settings = LevelSettings::new(name, seed.unwrap_or_else(rand::random));
            if let Some(generator) = generator {
                settings = settings.with_generator(generator, options.unwrap_or_default());
            }
            let level = LevelData::create(&config, &settings, &registry)?;
            print_info(&level);
        }
        Command::SetTime { dir, ticks } => {
            let mut level = LevelData::load(&config_for(Some(dir)), &registry)?;
            level.set_time(ticks);
            level.save()?;
            info!("Time set to {}", ticks);
        }
        Command::SetSpawn { dir, pos } => {
            let mut level = LevelData::load(&config_for(Some(dir)), &registry)?;
            level.set_spawn(pos);
            level.save()?;
            info!("Spawn set to {:?}", pos);
        }
    }
    Ok(())
}

fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("level_tool=info".parse()?)
                .add_directive("level_format=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    run(parse_args(&args)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_parse_create() {
        let command = parse_args(&args(&["create", "w", "My World", "-5", "flat"])).unwrap();
        assert_eq!(
            command,
            Command::Create {
                dir: PathBuf::from("w"),
                name: "My World".to_string(),
                seed: Some(-5),
                generator: Some("flat".to_string()),
                options: None,
            }
        );
    }

    #[test]
    fn test_parse_set_spawn() {
        let command = parse_args(&args(&["set-spawn", "w", "1", "64", "-2"])).unwrap();
        assert_eq!(
            command,
            Command::SetSpawn {
                dir: PathBuf::from("w"),
                pos: (1, 64, -2),
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_args(&[]).is_err());
        assert!(parse_args(&args(&["explode"])).is_err());
        assert!(parse_args(&args(&["set-time", "w"])).is_err());
        assert!(parse_args(&args(&["set-time", "w", "noon"])).is_err());
    }

    #[test]
    fn test_info_without_dir() {
        assert_eq!(
            parse_args(&args(&["info"])).unwrap(),
            Command::Info { dir: None }
        );
    }

    #[test]
    fn test_set_time_edits_level() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_path_buf();
        run(Command::Create {
            dir: path.clone(),
            name: "w".to_string(),
            seed: Some(1),
            generator: None,
            options: None,
        })
        .unwrap();

        run(Command::SetTime {
            dir: path.clone(),
            ticks: 500,
        })
        .unwrap();

        let level = LevelData::load(&LevelConfig::new(path), &BuiltinGenerators::new()).unwrap();
        assert_eq!(level.time(), 500);
    }
}
