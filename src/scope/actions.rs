//! Action vocabulary
//!
//! Canonical logical actions and the table mapping protocol verbs to the
//! actions they require.

use std::fmt;

/// A logical action a capability can grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Read,
    Write,
    Create,
    Update,
    Delete,
    Move,
    Copy,
}

impl Action {
    pub const ALL: [Action; 7] = [
        Action::Read,
        Action::Write,
        Action::Create,
        Action::Update,
        Action::Delete,
        Action::Move,
        Action::Copy,
    ];

    /// Parses an action name, ignoring case and surrounding whitespace.
    pub fn parse(raw: &str) -> Option<Action> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "read" => Some(Action::Read),
            "write" => Some(Action::Write),
            "create" => Some(Action::Create),
            "update" => Some(Action::Update),
            "delete" => Some(Action::Delete),
            "move" => Some(Action::Move),
            "copy" => Some(Action::Copy),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Write => "write",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Move => "move",
            Action::Copy => "copy",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remote-filesystem protocol verbs understood by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Head,
    Options,
    Propfind,
    Report,
    Search,
    Mkcol,
    Post,
    Put,
    Patch,
    Proppatch,
    Lock,
    Unlock,
    Delete,
    Move,
    Copy,
}

const READ: &[Action] = &[Action::Read];
const CREATE: &[Action] = &[Action::Create];
const UPDATE_OR_CREATE: &[Action] = &[Action::Update, Action::Create];
const UPDATE: &[Action] = &[Action::Update];
const DELETE: &[Action] = &[Action::Delete];
const MOVE: &[Action] = &[Action::Move];
const COPY: &[Action] = &[Action::Copy];

/// Verbs permitted against the app scope root itself.
///
/// Maintained separately from the verb table: a verb added to the protocol
/// is not allowed at the root until it is listed here.
const SCOPE_ROOT_METHODS: &[Method] = &[
    Method::Get,
    Method::Head,
    Method::Options,
    Method::Propfind,
    Method::Report,
    Method::Search,
    Method::Mkcol,
];

impl Method {
    /// Parses a verb; verbs are case-insensitive on the wire.
    pub fn parse(raw: &str) -> Option<Method> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "GET" => Some(Method::Get),
            "HEAD" => Some(Method::Head),
            "OPTIONS" => Some(Method::Options),
            "PROPFIND" => Some(Method::Propfind),
            "REPORT" => Some(Method::Report),
            "SEARCH" => Some(Method::Search),
            "MKCOL" => Some(Method::Mkcol),
            "POST" => Some(Method::Post),
            "PUT" => Some(Method::Put),
            "PATCH" => Some(Method::Patch),
            "PROPPATCH" => Some(Method::Proppatch),
            "LOCK" => Some(Method::Lock),
            "UNLOCK" => Some(Method::Unlock),
            "DELETE" => Some(Method::Delete),
            "MOVE" => Some(Method::Move),
            "COPY" => Some(Method::Copy),
            _ => None,
        }
    }

    /// Actions of which at least one must be granted to run this verb.
    pub fn required_actions(&self) -> &'static [Action] {
        match self {
            Method::Get
            | Method::Head
            | Method::Options
            | Method::Propfind
            | Method::Report
            | Method::Search => READ,
            Method::Mkcol | Method::Post => CREATE,
            Method::Put => UPDATE_OR_CREATE,
            Method::Patch | Method::Proppatch | Method::Lock | Method::Unlock => UPDATE,
            Method::Delete => DELETE,
            Method::Move => MOVE,
            Method::Copy => COPY,
        }
    }

    pub fn allowed_at_scope_root(&self) -> bool {
        SCOPE_ROOT_METHODS.contains(self)
    }

    /// MOVE and COPY carry a destination path.
    pub fn has_destination(&self) -> bool {
        matches!(self, Method::Move | Method::Copy)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Propfind => "PROPFIND",
            Method::Report => "REPORT",
            Method::Search => "SEARCH",
            Method::Mkcol => "MKCOL",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Proppatch => "PROPPATCH",
            Method::Lock => "LOCK",
            Method::Unlock => "UNLOCK",
            Method::Delete => "DELETE",
            Method::Move => "MOVE",
            Method::Copy => "COPY",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
