use std::str::FromStr;

use crate::{resp_value::RespValue, state::Command};

#[derive(Debug)]
pub enum Request<'data> {
    /// Needs the image pipeline before it can reach the state.
    Add { path: &'data str },
    Command(Command),
}

impl<'data> Request<'data> {
    pub fn deserialize(data: &'data [u8]) -> anyhow::Result<(Self, &'data [u8])> {
        if data.is_empty() {
            return Err(anyhow::format_err!("empty request"));
        }
        let (request_value, rest) = RespValue::deserialize(data)?;
        let elements = match request_value {
            RespValue::Array(elements) => elements,
            _ => return Err(anyhow::format_err!("requests must be arrays")),
        };

        let mut args = Vec::with_capacity(elements.len());
        for element in elements {
            match element {
                RespValue::BulkString(s) => args.push(s),
                _ => return Err(anyhow::format_err!("request arguments must be bulk strings")),
            }
        }
        let Some((name, args)) = args.split_first() else {
            return Err(anyhow::format_err!("empty command"));
        };

        let name = name.to_ascii_uppercase();
        let request = match name.as_str() {
            "PING" => Request::Command(Command::Ping),
            "ADD" => match args {
                [path] => Request::Add { path: *path },
                _ => return Err(anyhow::format_err!("malformed ADD command")),
            },
            "LIST" => Request::Command(Command::List),
            "OPEN" => match args {
                [index] => Request::Command(Command::Open(parse_arg(index, "OPEN")?)),
                _ => return Err(anyhow::format_err!("malformed OPEN command")),
            },
            "CLOSE" => Request::Command(Command::Close),
            "NEXT" => Request::Command(Command::Next),
            "PREV" => Request::Command(Command::Previous),
            "TOUCHSTART" => match args {
                [x] => Request::Command(Command::TouchStart(parse_position(x, "TOUCHSTART")?)),
                _ => return Err(anyhow::format_err!("malformed TOUCHSTART command")),
            },
            "TOUCHMOVE" => match args {
                [x] => Request::Command(Command::TouchMove(parse_position(x, "TOUCHMOVE")?)),
                _ => return Err(anyhow::format_err!("malformed TOUCHMOVE command")),
            },
            "TOUCHEND" => Request::Command(Command::TouchEnd),
            "TAP" => match args {
                [x, width] => Request::Command(Command::Tap {
                    x: parse_position(x, "TAP")?,
                    width: parse_position(width, "TAP")?,
                }),
                _ => return Err(anyhow::format_err!("malformed TAP command")),
            },
            "VIEW" => Request::Command(Command::View),
            "SWEEP" => Request::Command(Command::Sweep),
            command => return Err(anyhow::format_err!("unknown command {:?}", command)),
        };
        Ok((request, rest))
    }
}

fn parse_arg<T>(arg: &str, command: &str) -> anyhow::Result<T>
where
    T: FromStr,
{
    arg.parse::<T>()
        .map_err(|_| anyhow::format_err!("invalid argument {:?} for {}", arg, command))
}

/// Screen coordinates must be real numbers; `f64` parsing also accepts
/// `NaN` and `inf`.
fn parse_position(arg: &str, command: &str) -> anyhow::Result<f64> {
    let position: f64 = parse_arg(arg, command)?;
    if !position.is_finite() {
        anyhow::bail!("invalid argument {:?} for {}", arg, command);
    }
    Ok(position)
}
