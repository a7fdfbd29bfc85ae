//! Module `commands`
//!
//! Parses request lines received on the control connection into the
//! [`Command`] enum. Arguments are whitespace separated; paths therefore
//! cannot contain whitespace.

use crate::protocol::responses::format_response;
use crate::scope::Method;

/// Subcommands of `RECYCLE`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecycleCommand {
    List,
    Restore(String),
    Purge(String),
    Clear,
}

/// Operations available on a directed share through `SHARED`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SharedOp {
    List,
    Get,
    Put,
    Mkcol,
    Delete,
}

/// Operations available on a public link through `PUBLIC`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicOp {
    List,
    Get,
}

/// A parsed request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    User(String),
    Pass(String),
    /// Raw app capability token, parsed later against the principal
    Token(String),
    Quit,
    /// A storage verb on the caller's own tree. `arg` is the destination for
    /// MOVE/COPY and the body length for PUT.
    Dav {
        method: Method,
        path: String,
        arg: Option<String>,
    },
    Recycle(RecycleCommand),
    Share {
        path: String,
        username: String,
        permissions: String,
        expires: Option<String>,
    },
    Link {
        path: String,
        permissions: String,
        expires: Option<String>,
    },
    Unshare(String),
    Shares,
    Shared {
        op: SharedOp,
        id: String,
        relative: String,
        length: Option<String>,
    },
    Public {
        op: PublicOp,
        token: String,
        relative: String,
    },
    /// Known command with missing or extra arguments
    Malformed(String),
    Unknown(String),
}

impl Command {
    /// Number of body bytes that follow the request line, if any.
    ///
    /// `Err` carries the unparsable length text.
    pub fn body_length(&self) -> Option<Result<u64, String>> {
        let raw = match self {
            Command::Dav {
                method: Method::Put,
                arg,
                ..
            } => arg.as_deref().unwrap_or(""),
            Command::Shared {
                op: SharedOp::Put,
                length,
                ..
            } => length.as_deref().unwrap_or(""),
            _ => return None,
        };
        Some(raw.parse::<u64>().map_err(|_| raw.to_string()))
    }
}

/// Represents the outcome status of executing a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandStatus {
    Success,
    Failure(String),
    CloseConnection,
}

/// Full result of a command: the response line plus any payload that
/// follows it on the wire.
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub status: CommandStatus,
    pub message: Option<String>,
    pub data: Option<Vec<u8>>,
}

impl CommandResult {
    pub fn success(code: u16, message: &str) -> Self {
        Self {
            status: CommandStatus::Success,
            message: Some(format_response(code, message)),
            data: None,
        }
    }

    pub fn with_data(code: u16, message: &str, data: Vec<u8>) -> Self {
        Self {
            status: CommandStatus::Success,
            message: Some(format_response(code, message)),
            data: Some(data),
        }
    }

    pub fn failure(code: u16, message: &str) -> Self {
        Self {
            status: CommandStatus::Failure(message.to_string()),
            message: Some(format_response(code, message)),
            data: None,
        }
    }

    /// Status code of the response line
    pub fn code(&self) -> Option<u16> {
        self.message.as_deref()?.get(..3)?.parse().ok()
    }

    /// Response line text after the status code
    pub fn text(&self) -> Option<&str> {
        self.message
            .as_deref()?
            .get(4..)
            .map(|text| text.trim_end_matches("\r\n"))
    }
}

/// Parses one request line.
pub fn parse_command(raw: &str) -> Command {
    let trimmed = raw.trim();
    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let cmd = parts.next().unwrap_or("").to_ascii_uppercase();
    let rest = parts.next().unwrap_or("").trim();
    let args: Vec<&str> = rest.split_whitespace().collect();

    match cmd.as_str() {
        "QUIT" | "Q" => Command::Quit,
        "USER" if !rest.is_empty() => Command::User(rest.to_string()),
        "PASS" if !rest.is_empty() => Command::Pass(rest.to_string()),
        "TOKEN" if !rest.is_empty() => Command::Token(rest.to_string()),
        "RECYCLE" => parse_recycle(&args),
        "SHARE" => match args.as_slice() {
            [path, user, perms] => Command::Share {
                path: path.to_string(),
                username: user.to_string(),
                permissions: perms.to_string(),
                expires: None,
            },
            [path, user, perms, expires] => Command::Share {
                path: path.to_string(),
                username: user.to_string(),
                permissions: perms.to_string(),
                expires: Some(expires.to_string()),
            },
            _ => Command::Malformed(cmd.clone()),
        },
        "LINK" => match args.as_slice() {
            [path, perms] => Command::Link {
                path: path.to_string(),
                permissions: perms.to_string(),
                expires: None,
            },
            [path, perms, expires] => Command::Link {
                path: path.to_string(),
                permissions: perms.to_string(),
                expires: Some(expires.to_string()),
            },
            _ => Command::Malformed(cmd.clone()),
        },
        "UNSHARE" => match args.as_slice() {
            [id] => Command::Unshare(id.to_string()),
            _ => Command::Malformed(cmd.clone()),
        },
        "SHARES" => Command::Shares,
        "SHARED" => parse_shared(&args),
        "PUBLIC" => parse_public(&args),
        "USER" | "PASS" | "TOKEN" => Command::Malformed(cmd.clone()),
        _ => match Method::parse(&cmd) {
            Some(method) => parse_dav(method, &args),
            None => Command::Unknown(cmd.clone()),
        },
    }
}

fn parse_dav(method: Method, args: &[&str]) -> Command {
    match (method, args) {
        (Method::Move | Method::Copy, [path, destination]) => Command::Dav {
            method,
            path: path.to_string(),
            arg: Some(destination.to_string()),
        },
        (Method::Put, [path, length]) => Command::Dav {
            method,
            path: path.to_string(),
            arg: Some(length.to_string()),
        },
        (Method::Move | Method::Copy | Method::Put, _) => Command::Malformed(method.to_string()),
        (_, [path]) => Command::Dav {
            method,
            path: path.to_string(),
            arg: None,
        },
        _ => Command::Malformed(method.to_string()),
    }
}

fn parse_recycle(args: &[&str]) -> Command {
    let sub = args.first().map(|s| s.to_ascii_uppercase());
    match (sub.as_deref(), args.get(1..).unwrap_or_default()) {
        (Some("LIST"), []) => Command::Recycle(RecycleCommand::List),
        (Some("CLEAR"), []) => Command::Recycle(RecycleCommand::Clear),
        (Some("RESTORE"), [hash]) => Command::Recycle(RecycleCommand::Restore(hash.to_string())),
        (Some("PURGE"), [hash]) => Command::Recycle(RecycleCommand::Purge(hash.to_string())),
        _ => Command::Malformed("RECYCLE".into()),
    }
}

fn parse_shared(args: &[&str]) -> Command {
    let op = match args.first().map(|s| s.to_ascii_uppercase()).as_deref() {
        Some("LIST") => SharedOp::List,
        Some("GET") => SharedOp::Get,
        Some("PUT") => SharedOp::Put,
        Some("MKCOL") => SharedOp::Mkcol,
        Some("DELETE") => SharedOp::Delete,
        _ => return Command::Malformed("SHARED".into()),
    };

    let shared = |id: &str, relative: &str, length: Option<&str>| Command::Shared {
        op,
        id: id.to_string(),
        relative: relative.to_string(),
        length: length.map(str::to_string),
    };

    match (op, &args[1..]) {
        (SharedOp::Put, [id, relative, length]) => shared(id, relative, Some(*length)),
        (SharedOp::Put, _) => Command::Malformed("SHARED".into()),
        (_, [id]) => shared(id, "", None),
        (_, [id, relative]) => shared(id, relative, None),
        _ => Command::Malformed("SHARED".into()),
    }
}

fn parse_public(args: &[&str]) -> Command {
    let op = match args.first().map(|s| s.to_ascii_uppercase()).as_deref() {
        Some("LIST") => PublicOp::List,
        Some("GET") => PublicOp::Get,
        _ => return Command::Malformed("PUBLIC".into()),
    };

    match &args[1..] {
        [token] => Command::Public {
            op,
            token: token.to_string(),
            relative: String::new(),
        },
        [token, relative] => Command::Public {
            op,
            token: token.to_string(),
            relative: relative.to_string(),
        },
        _ => Command::Malformed("PUBLIC".into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_commands() {
        assert_eq!(parse_command("USER alice\r\n"), Command::User("alice".into()));
        assert_eq!(parse_command("pass alice123"), Command::Pass("alice123".into()));
        assert_eq!(
            parse_command("TOKEN app:shop.example=read,write"),
            Command::Token("app:shop.example=read,write".into())
        );
        assert_eq!(parse_command("quit"), Command::Quit);
        assert_eq!(parse_command("USER"), Command::Malformed("USER".into()));
    }

    #[test]
    fn test_dav_verbs() {
        assert_eq!(
            parse_command("propfind /apps"),
            Command::Dav {
                method: Method::Propfind,
                path: "/apps".into(),
                arg: None
            }
        );
        assert_eq!(
            parse_command("MOVE /a.txt /b.txt"),
            Command::Dav {
                method: Method::Move,
                path: "/a.txt".into(),
                arg: Some("/b.txt".into())
            }
        );
        assert_eq!(parse_command("MOVE /a.txt"), Command::Malformed("MOVE".into()));
        assert_eq!(parse_command("BREW /pot"), Command::Unknown("BREW".into()));
    }

    #[test]
    fn test_body_length() {
        assert_eq!(parse_command("PUT /a.txt 12").body_length(), Some(Ok(12)));
        assert_eq!(
            parse_command("PUT /a.txt lots").body_length(),
            Some(Err("lots".into()))
        );
        assert_eq!(
            parse_command("SHARED PUT abc notes/x.txt 3").body_length(),
            Some(Ok(3))
        );
        assert_eq!(parse_command("GET /a.txt").body_length(), None);
    }

    #[test]
    fn test_recycle_and_share_commands() {
        assert_eq!(
            parse_command("RECYCLE restore deadbeef"),
            Command::Recycle(RecycleCommand::Restore("deadbeef".into()))
        );
        assert_eq!(
            parse_command("RECYCLE PURGE"),
            Command::Malformed("RECYCLE".into())
        );
        assert_eq!(
            parse_command("SHARE /projects bob read,write 2030-01-01T00:00:00Z"),
            Command::Share {
                path: "/projects".into(),
                username: "bob".into(),
                permissions: "read,write".into(),
                expires: Some("2030-01-01T00:00:00Z".into()),
            }
        );
        assert_eq!(
            parse_command("SHARED GET abc notes/todo.txt"),
            Command::Shared {
                op: SharedOp::Get,
                id: "abc".into(),
                relative: "notes/todo.txt".into(),
                length: None,
            }
        );
        assert_eq!(
            parse_command("PUBLIC LIST tok"),
            Command::Public {
                op: PublicOp::List,
                token: "tok".into(),
                relative: String::new(),
            }
        );
    }
}
