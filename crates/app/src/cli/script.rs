//! Line scripts for `soundpool simulate`
//!
//! One step per line, blank lines and `#`/`;` comments ignored:
//!
//! ```text
//! sound engine 2000              # synthetic 2 s resource
//! listener 0,0,0 forward=0,0,-1
//! start engine 15,0,0 owner=1 loops=-1 volume=0.8
//! tick 100
//! fade 0 250
//! move 0 5,0,0
//! stop 0
//! stop-owner 1
//! volume 0.5
//! level 2
//! status
//! ```
//!
//! Vectors are comma separated; `-` as a start position means none.

use soundpool_core::domain::args::ArgValue;
use soundpool_core::domain::channel::{ChannelId, OwnerId};
use soundpool_core::domain::command::Command;
use soundpool_core::domain::controller::SoundParams;
use soundpool_core::domain::lines::skip_comments;
use soundpool_core::domain::spatial::{Listener, Vec3};
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
#[error("line {line}: {message}")]
pub struct ScriptError {
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Register a silent resource lasting `duration_ms`
    Sound { name: String, duration_ms: u64 },
    /// Queue a command on the service
    Send(Command),
    /// Advance the clock, then tick the service
    Tick { ms: u64 },
    /// Print the pool as JSON
    Status,
}

#[derive(Debug, Default)]
pub struct Script {
    steps: Vec<(usize, Step)>,
}

impl Script {
    pub fn parse(text: &str) -> Result<Self, ScriptError> {
        let mut steps = Vec::new();
        for (index, line) in text.lines().enumerate() {
            let line = line.split('#').next().unwrap_or_default();
            if !skip_comments(line) {
                continue;
            }
            let step = parse_step(line).map_err(|message| ScriptError {
                line: index + 1,
                message,
            })?;
            steps.push((index + 1, step));
        }
        Ok(Self { steps })
    }

    /// Steps with their 1-based line numbers
    pub fn steps(&self) -> &[(usize, Step)] {
        &self.steps
    }

    /// Synthetic resources declared anywhere in the script
    pub fn sounds(&self) -> impl Iterator<Item = (&str, u64)> + '_ {
        self.steps.iter().filter_map(|(_, step)| match step {
            Step::Sound { name, duration_ms } => Some((name.as_str(), *duration_ms)),
            _ => None,
        })
    }
}

type ParseResult<T> = std::result::Result<T, String>;

/// Longest synthetic `sound`, ten minutes
pub const MAX_SOUND_MS: u64 = 600_000;

/// A script line split into its verb, positional words and `key=value` options
struct Words<'a> {
    verb: String,
    positional: Vec<&'a str>,
    options: HashMap<String, &'a str>,
}

impl<'a> Words<'a> {
    fn split(line: &'a str) -> Self {
        let mut words = line.split_whitespace();
        let verb = words.next().unwrap_or_default().to_lowercase();

        let mut positional = Vec::new();
        let mut options = HashMap::new();
        for word in words {
            match word.split_once('=') {
                Some((key, value)) => {
                    options.insert(key.to_lowercase(), value);
                }
                None => positional.push(word),
            }
        }
        Self {
            verb,
            positional,
            options,
        }
    }

    fn arg(&self, index: usize, what: &str) -> ParseResult<&'a str> {
        self.positional
            .get(index)
            .copied()
            .ok_or_else(|| format!("`{}` needs {what}", self.verb))
    }

    fn option<T: FromStr>(&self, key: &str) -> ParseResult<Option<T>> {
        self.options.get(key).map(|text| number(text)).transpose()
    }
}

fn parse_step(line: &str) -> ParseResult<Step> {
    let words = Words::split(line);

    let step = match words.verb.as_str() {
        "sound" => {
            let name = words.arg(0, "a sound name")?.to_string();
            let duration_ms = number(words.arg(1, "a duration in ms")?)?;
            if duration_ms > MAX_SOUND_MS {
                return Err(format!("sound longer than {MAX_SOUND_MS} ms"));
            }
            Step::Sound { name, duration_ms }
        }
        "start" => {
            let name = words.arg(0, "a sound name")?.to_string();
            let position = match words.arg(1, "a position")? {
                "-" => None,
                text => Some(vec3(text)?),
            };
            let defaults = SoundParams::default();
            let params = SoundParams {
                volume: words.option("volume")?.unwrap_or(defaults.volume),
                loops: words.option("loops")?.unwrap_or(defaults.loops),
                level: words.option("level")?.unwrap_or(defaults.level),
            };
            let owner = words.option::<usize>("owner")?.and_then(OwnerId::from_raw);
            Step::Send(Command::Start {
                name,
                params,
                position,
                owner,
            })
        }
        "stop" => Step::Send(Command::Stop {
            id: ChannelId::new(number(words.arg(0, "a channel")?)?),
        }),
        "stop-owner" => Step::Send(Command::StopByOwner {
            owner: OwnerId::from_raw(number(words.arg(0, "an owner")?)?),
        }),
        "fade" => Step::Send(Command::FadeOut {
            id: ChannelId::new(number(words.arg(0, "a channel")?)?),
            duration_ms: number(words.arg(1, "a duration in ms")?)?,
        }),
        "move" => Step::Send(Command::MoveEmitter {
            id: ChannelId::new(number(words.arg(0, "a channel")?)?),
            position: vec3(words.arg(1, "a position")?)?,
        }),
        "listener" => {
            let position = vec3(words.arg(0, "a position")?)?;
            let forward = match words.options.get("forward") {
                Some(text) => vec3(text)?,
                None => Vec3::new(0.0, 0.0, -1.0),
            };
            let up = match words.options.get("up") {
                Some(text) => vec3(text)?,
                None => Vec3::new(0.0, 1.0, 0.0),
            };
            Step::Send(Command::SetListener {
                listener: Listener::new(position, forward, up),
            })
        }
        "volume" => Step::Send(Command::SetMasterVolume {
            volume: number(words.arg(0, "a volume")?)?,
        }),
        "level" => Step::Send(Command::SetSoundLevel {
            level: number(words.arg(0, "a level")?)?,
        }),
        "tick" => Step::Tick {
            ms: match words.positional.first() {
                Some(text) => number(text)?,
                None => 0,
            },
        },
        "status" => Step::Status,
        other => return Err(format!("unknown step `{other}`")),
    };
    Ok(step)
}

fn number<T: FromStr>(text: &str) -> ParseResult<T> {
    text.parse().map_err(|_| format!("invalid number `{text}`"))
}

fn vec3(text: &str) -> ParseResult<Vec3> {
    let value = ArgValue::parse(text);
    if value.items().len() != 3 {
        return Err(format!("expected x,y,z but got `{text}`"));
    }
    let component = |index: usize| number::<f32>(value.get(index).unwrap_or_default());
    Ok(Vec3::new(component(0)?, component(1)?, component(2)?))
}
