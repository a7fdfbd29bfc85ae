//! Command handlers module for the rax-drive server.
//!
//! Dispatches parsed commands for one session: authentication, storage verbs
//! on the caller's own tree, the recycle bin and shares. Every storage verb
//! derives the app scope for the request and passes
//! [`crate::scope::AppScope::authorize_request`] before touching the filesystem.

use chrono::{DateTime, Utc};
use log::{debug, info};

use crate::auth::{self, Principal};
use crate::client::Client;
use crate::error::handlers::{handle_error, status_code};
use crate::error::{AuthError, DriveError, StorageError};
use crate::protocol::commands::{
    Command, CommandResult, CommandStatus, PublicOp, RecycleCommand, SharedOp,
};
use crate::protocol::responses::*;
use crate::recycle::RecycleRecord;
use crate::scope::{Action, Method, resolve_scope};
use crate::server::DriveState;
use crate::share::{self, OpenedShare, ShareRecord};
use crate::storage::operations::{self as storage, user_root};
use crate::storage::validation::{normalize_virtual_path, virtual_to_real_path};
use crate::storage::EntryInfo;

const SUPPORTED_METHODS: &str = "GET HEAD OPTIONS PROPFIND MKCOL PUT DELETE MOVE COPY";

/// Dispatches a received command to its handler.
///
/// `body` holds the bytes that followed a PUT-style request line.
pub async fn handle_command(
    state: &DriveState,
    client: &mut Client,
    command: Command,
    body: Option<Vec<u8>>,
) -> CommandResult {
    match command {
        Command::Quit => handle_cmd_quit(client),
        Command::User(username) => handle_cmd_user(state, client, &username),
        Command::Pass(password) => handle_cmd_pass(state, client, &password),
        Command::Malformed(cmd) => {
            CommandResult::failure(BAD_REQUEST, &format!("Syntax error in {} arguments", cmd))
        }
        Command::Unknown(cmd) => {
            CommandResult::failure(NOT_IMPLEMENTED, &format!("{} not implemented", cmd))
        }
        Command::Public {
            op,
            token,
            relative,
        } => respond(handle_cmd_public(state, op, &token, &relative).await),
        command => {
            let Some(principal) = client.principal() else {
                return respond(Err(AuthError::NotLoggedIn.into()));
            };
            handle_session_command(state, client, &principal, command, body).await
        }
    }
}

async fn handle_session_command(
    state: &DriveState,
    client: &mut Client,
    principal: &Principal,
    command: Command,
    body: Option<Vec<u8>>,
) -> CommandResult {
    let result = match command {
        Command::Token(raw) => {
            client.present_token(&raw);
            debug!("User {} presented an app token", principal.username);
            Ok(CommandResult::success(OK, "Token recorded"))
        }
        Command::Dav { method, path, arg } => {
            handle_cmd_dav(state, principal, method, &path, arg.as_deref(), body).await
        }
        Command::Recycle(sub) => handle_cmd_recycle(state, principal, sub).await,
        Command::Share {
            path,
            username,
            permissions,
            expires,
        } => handle_cmd_share(state, principal, &path, &username, &permissions, expires).await,
        Command::Link {
            path,
            permissions,
            expires,
        } => handle_cmd_link(state, principal, &path, &permissions, expires).await,
        Command::Unshare(id) => handle_cmd_unshare(state, principal, &id).await,
        Command::Shares => handle_cmd_shares(state, principal).await,
        Command::Shared {
            op,
            id,
            relative,
            ..
        } => handle_cmd_shared(state, principal, op, &id, &relative, body).await,
        _ => Err(DriveError::ProtocolError("unexpected command".into())),
    };
    respond(result)
}

/// Turns a handler result into a response, logging failures.
fn respond(result: Result<CommandResult, DriveError>) -> CommandResult {
    result.unwrap_or_else(|err| {
        handle_error(&err);
        CommandResult::failure(status_code(&err), &err.to_string())
    })
}

/// Handles the QUIT command: logs out the client and signals connection close.
fn handle_cmd_quit(client: &mut Client) -> CommandResult {
    client.logout();
    CommandResult {
        status: CommandStatus::CloseConnection,
        message: Some(format_response(GOODBYE, "Goodbye")),
        data: None,
    }
}

fn handle_cmd_user(state: &DriveState, client: &mut Client, username: &str) -> CommandResult {
    match auth::validate_user(username, state.startup.max_username_length) {
        Ok(()) => {
            client.set_user(Some(username.to_string()));
            CommandResult::success(
                PASSWORD_REQUIRED,
                &format!("Password required for {}", username),
            )
        }
        Err(e) => {
            client.set_user(None);
            respond(Err(e.into()))
        }
    }
}

fn handle_cmd_pass(state: &DriveState, client: &mut Client, password: &str) -> CommandResult {
    let Some(username) = client.username().filter(|_| client.is_user_valid()).cloned() else {
        return CommandResult::failure(NOT_LOGGED_IN, "Please enter the username first");
    };

    match auth::validate_password(&username, password, state.startup.max_command_length) {
        Ok(principal) => {
            let root = user_root(&state.startup.storage_root_path(), &username);
            if let Err(e) = std::fs::create_dir_all(&root) {
                return respond(Err(e.into()));
            }
            info!("User {} logged in", username);
            client.set_logged_in(principal);
            CommandResult::success(LOGIN_SUCCESS, "Login successful")
        }
        Err(e) => respond(Err(e.into())),
    }
}

/// Storage verbs on the caller's own tree.
async fn handle_cmd_dav(
    state: &DriveState,
    principal: &Principal,
    method: Method,
    path: &str,
    arg: Option<&str>,
    body: Option<Vec<u8>>,
) -> Result<CommandResult, DriveError> {
    let scope = resolve_scope(principal, &state.app_scope)?;
    let destination = if method.has_destination() { arg } else { None };
    scope.authorize_request(method, path, destination)?;

    let root = user_root(&state.startup.storage_root_path(), &principal.username);
    let virtual_path = normalize_virtual_path(path);
    let real = virtual_to_real_path(&root, &virtual_path);

    match method {
        Method::Get => {
            let data = storage::read_file(&real)?;
            Ok(CommandResult::with_data(OK, &data.len().to_string(), data))
        }
        Method::Head => {
            let entry = storage::stat(&real)?;
            Ok(CommandResult::success(OK, &entry.to_string()))
        }
        Method::Options => Ok(CommandResult::success(OK, SUPPORTED_METHODS)),
        Method::Propfind => {
            let entries = if real.is_dir() {
                storage::list_directory(&real)?
            } else {
                vec![storage::stat(&real)?]
            };
            Ok(listing(&entries))
        }
        Method::Mkcol => {
            storage::make_collection(&real)?;
            Ok(CommandResult::success(CREATED, &format!("Created {}", virtual_path)))
        }
        Method::Put => {
            if virtual_path == "/" {
                return Err(StorageError::InvalidPath(virtual_path).into());
            }
            let data = body.unwrap_or_default();
            if storage::write_file(&real, &data)? {
                Ok(CommandResult::success(CREATED, &format!("Created {}", virtual_path)))
            } else {
                Ok(CommandResult::success(NO_CONTENT, &format!("Replaced {}", virtual_path)))
            }
        }
        Method::Delete => {
            let records = state.recycle.soft_delete(principal, &scope, &virtual_path).await?;
            Ok(CommandResult::success(
                NO_CONTENT,
                &format!("Moved {} file(s) to the recycle bin", records.len()),
            ))
        }
        Method::Move | Method::Copy => {
            let destination = normalize_virtual_path(destination.unwrap_or_default());
            if virtual_path == "/" || destination == "/" {
                return Err(StorageError::InvalidPath(virtual_path).into());
            }
            let real_destination = virtual_to_real_path(&root, &destination);
            if method == Method::Move {
                storage::move_entry(&real, &real_destination)?;
            } else {
                storage::copy_entry(&real, &real_destination)?;
            }
            Ok(CommandResult::success(
                CREATED,
                &format!("{} {} -> {}", method, virtual_path, destination),
            ))
        }
        _ => Ok(CommandResult::failure(
            NOT_IMPLEMENTED,
            &format!("{} not supported", method),
        )),
    }
}

async fn handle_cmd_recycle(
    state: &DriveState,
    principal: &Principal,
    command: RecycleCommand,
) -> Result<CommandResult, DriveError> {
    let scope = resolve_scope(principal, &state.app_scope)?;

    match command {
        RecycleCommand::List => {
            let records = state.recycle.list(principal, &scope).await;
            let lines: Vec<String> = records.iter().map(recycle_line).collect();
            Ok(lines_result(OK, lines))
        }
        RecycleCommand::Restore(hash) => {
            let record = state.recycle.recover(principal, &scope, &hash).await?;
            Ok(CommandResult::success(
                OK,
                &format!("Restored {}", record.original_relative_path),
            ))
        }
        RecycleCommand::Purge(hash) => {
            state.recycle.purge(principal, &scope, &hash).await?;
            Ok(CommandResult::success(NO_CONTENT, &format!("Purged {}", hash)))
        }
        RecycleCommand::Clear => {
            let outcome = state.recycle.clear(principal, &scope).await;
            match outcome.first_error {
                Some(err) => {
                    let err = DriveError::from(err);
                    handle_error(&err);
                    Ok(CommandResult::failure(
                        status_code(&err),
                        &format!("Cleared {} file(s); {}", outcome.cleared, err),
                    ))
                }
                None => Ok(CommandResult::success(
                    OK,
                    &format!("Cleared {} file(s)", outcome.cleared),
                )),
            }
        }
    }
}

fn parse_expiry(raw: Option<String>) -> Result<Option<DateTime<Utc>>, DriveError> {
    raw.map(|raw| {
        DateTime::parse_from_rfc3339(&raw)
            .map(|at| at.with_timezone(&Utc))
            .map_err(|e| DriveError::ProtocolError(format!("invalid expiry '{}': {}", raw, e)))
    })
    .transpose()
}

async fn handle_cmd_share(
    state: &DriveState,
    principal: &Principal,
    path: &str,
    username: &str,
    permissions: &str,
    expires: Option<String>,
) -> Result<CommandResult, DriveError> {
    let scope = resolve_scope(principal, &state.app_scope)?;
    let expires_at = parse_expiry(expires)?;
    let record = state
        .shares
        .create_directed(principal, &scope, path, username, permissions, expires_at)
        .await?;
    Ok(CommandResult::success(CREATED, &record.id))
}

async fn handle_cmd_link(
    state: &DriveState,
    principal: &Principal,
    path: &str,
    permissions: &str,
    expires: Option<String>,
) -> Result<CommandResult, DriveError> {
    let scope = resolve_scope(principal, &state.app_scope)?;
    let expires_at = parse_expiry(expires)?;
    let record = state
        .shares
        .create_public(principal, &scope, path, permissions, expires_at)
        .await?;
    Ok(CommandResult::success(
        CREATED,
        &format!("{} {}", record.id, record.token().unwrap_or_default()),
    ))
}

async fn handle_cmd_unshare(
    state: &DriveState,
    principal: &Principal,
    id: &str,
) -> Result<CommandResult, DriveError> {
    let scope = resolve_scope(principal, &state.app_scope)?;
    state.shares.revoke(principal, &scope, id).await?;
    Ok(CommandResult::success(NO_CONTENT, "Share revoked"))
}

async fn handle_cmd_shares(
    state: &DriveState,
    principal: &Principal,
) -> Result<CommandResult, DriveError> {
    let scope = resolve_scope(principal, &state.app_scope)?;
    let outgoing = state.shares.list_outgoing(principal, &scope).await;
    let incoming = state.shares.list_incoming(principal, &scope).await;

    let lines = outgoing
        .iter()
        .map(|share| share_line("out", share))
        .chain(incoming.iter().map(|share| share_line("in", share)))
        .collect();
    Ok(lines_result(OK, lines))
}

fn shared_actions(op: SharedOp) -> &'static [Action] {
    match op {
        SharedOp::List | SharedOp::Get => &[Action::Read],
        SharedOp::Put => &[Action::Update, Action::Create],
        SharedOp::Mkcol => &[Action::Create],
        SharedOp::Delete => &[Action::Delete],
    }
}

async fn handle_cmd_shared(
    state: &DriveState,
    principal: &Principal,
    op: SharedOp,
    id: &str,
    relative: &str,
    body: Option<Vec<u8>>,
) -> Result<CommandResult, DriveError> {
    let scope = resolve_scope(principal, &state.app_scope)?;
    let opened = state
        .shares
        .open_directed(principal, &scope, id, relative, shared_actions(op))
        .await?;

    match op {
        SharedOp::List => Ok(listing(&share::operations::list(&opened)?)),
        SharedOp::Get => Ok(file_result(&opened)?),
        SharedOp::Put => {
            let data = body.unwrap_or_default();
            if share::operations::write(&opened, &data)? {
                Ok(CommandResult::success(CREATED, &opened.path.virtual_target))
            } else {
                Ok(CommandResult::success(NO_CONTENT, &opened.path.virtual_target))
            }
        }
        SharedOp::Mkcol => {
            share::operations::mkdir(&opened)?;
            Ok(CommandResult::success(CREATED, &opened.path.virtual_target))
        }
        SharedOp::Delete => {
            let count = share::operations::remove(&opened, &state.recycle).await?;
            Ok(CommandResult::success(
                NO_CONTENT,
                &format!("Moved {} file(s) to the owner's recycle bin", count),
            ))
        }
    }
}

async fn handle_cmd_public(
    state: &DriveState,
    op: PublicOp,
    token: &str,
    relative: &str,
) -> Result<CommandResult, DriveError> {
    let opened = state
        .shares
        .open_public(token, relative, &[Action::Read])
        .await?;

    match op {
        PublicOp::List => Ok(listing(&share::operations::list(&opened)?)),
        PublicOp::Get => Ok(file_result(&opened)?),
    }
}

fn file_result(opened: &OpenedShare) -> Result<CommandResult, DriveError> {
    let data = share::operations::read(opened)?;
    Ok(CommandResult::with_data(OK, &data.len().to_string(), data))
}

fn listing(entries: &[EntryInfo]) -> CommandResult {
    lines_result(MULTI_STATUS, entries.iter().map(|e| e.to_string()).collect())
}

/// A `<code> <n>` header followed by `n` CRLF-terminated lines.
fn lines_result(code: u16, lines: Vec<String>) -> CommandResult {
    let mut data = String::new();
    for line in &lines {
        data.push_str(line);
        data.push_str("\r\n");
    }
    CommandResult::with_data(code, &lines.len().to_string(), data.into_bytes())
}

fn recycle_line(record: &RecycleRecord) -> String {
    format!(
        "{}|{}|{}|{}",
        record.content_hash,
        record.original_relative_path,
        record.size_bytes,
        record.deleted_at.to_rfc3339()
    )
}

fn share_line(direction: &str, share: &ShareRecord) -> String {
    let expires = share
        .expires_at
        .map(|at| at.to_rfc3339())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{}|{}|{}|{}|{}|{}",
        direction, share.id, share.owner_username, share.stored_path, share.permissions, expires
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppScopeConfig, RuntimeConfig, ServerConfig, StartupConfig};
    use crate::protocol::commands::parse_command;

    fn test_state(dir: &std::path::Path, scoped: bool) -> DriveState {
        let app_scope = if scoped {
            AppScopeConfig {
                required_resource_pattern: "app:*".into(),
                ..AppScopeConfig::default()
            }
        } else {
            AppScopeConfig::default()
        };
        DriveState::new(ServerConfig {
            startup: StartupConfig {
                bind_address: "127.0.0.1".into(),
                control_port: 0,
                storage_root: dir.to_string_lossy().to_string(),
                recycle_dir_name: ".recycle".into(),
                recycle_retention_days: 30,
                sweep_interval_secs: 3600,
                max_command_length: 512,
                max_username_length: 32,
            },
            runtime: RuntimeConfig {
                max_clients: 10,
                max_upload_size_mb: 1,
            },
            app_scope,
        })
    }

    async fn run(state: &DriveState, client: &mut Client, line: &str) -> CommandResult {
        handle_command(state, client, parse_command(line), None).await
    }

    async fn run_with_body(
        state: &DriveState,
        client: &mut Client,
        line: &str,
        body: &[u8],
    ) -> CommandResult {
        handle_command(state, client, parse_command(line), Some(body.to_vec())).await
    }

    async fn login(state: &DriveState, user: &str, password: &str) -> Client {
        let mut client = Client::default();
        run(state, &mut client, &format!("USER {}", user)).await;
        let result = run(state, &mut client, &format!("PASS {}", password)).await;
        assert_eq!(result.code(), Some(LOGIN_SUCCESS));
        client
    }

    #[tokio::test]
    async fn test_login_required() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path(), false);
        let mut client = Client::default();

        let result = run(&state, &mut client, "GET /a.txt").await;
        assert_eq!(result.code(), Some(NOT_LOGGED_IN));

        let result = run(&state, &mut client, "PASS alice123").await;
        assert_eq!(result.code(), Some(NOT_LOGGED_IN));

        run(&state, &mut client, "USER alice").await;
        let result = run(&state, &mut client, "PASS wrong").await;
        assert_eq!(result.code(), Some(NOT_LOGGED_IN));
    }

    #[tokio::test]
    async fn test_put_get_delete_restore() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path(), false);
        let mut client = login(&state, "alice", "alice123").await;

        assert_eq!(run(&state, &mut client, "MKCOL /docs").await.code(), Some(CREATED));
        let put = run_with_body(&state, &mut client, "PUT /docs/a.txt 5", b"hello").await;
        assert_eq!(put.code(), Some(CREATED));
        let put = run_with_body(&state, &mut client, "PUT /docs/a.txt 3", b"bye").await;
        assert_eq!(put.code(), Some(NO_CONTENT));

        let get = run(&state, &mut client, "GET /docs/a.txt").await;
        assert_eq!(get.code(), Some(OK));
        assert_eq!(get.data.as_deref(), Some(&b"bye"[..]));

        let propfind = run(&state, &mut client, "PROPFIND /docs").await;
        assert_eq!(propfind.code(), Some(MULTI_STATUS));
        assert!(String::from_utf8_lossy(propfind.data.as_deref().unwrap()).starts_with("a.txt|3|"));

        assert_eq!(
            run(&state, &mut client, "DELETE /docs/a.txt").await.code(),
            Some(NO_CONTENT)
        );
        assert_eq!(run(&state, &mut client, "GET /docs/a.txt").await.code(), Some(404));

        let listing = run(&state, &mut client, "RECYCLE LIST").await;
        let text = String::from_utf8(listing.data.unwrap()).unwrap();
        let hash = text.split('|').next().unwrap().to_string();

        let restore = run(&state, &mut client, &format!("RECYCLE RESTORE {}", hash)).await;
        assert_eq!(restore.code(), Some(OK));
        assert!(dir.path().join("alice/docs/a.txt").is_file());
    }

    #[tokio::test]
    async fn test_move_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path(), false);
        let mut client = login(&state, "alice", "alice123").await;

        run_with_body(&state, &mut client, "PUT /a.txt 1", b"a").await;
        run_with_body(&state, &mut client, "PUT /b.txt 1", b"b").await;
        assert_eq!(
            run(&state, &mut client, "MOVE /a.txt /b.txt").await.code(),
            Some(409)
        );
        assert_eq!(
            run(&state, &mut client, "COPY /a.txt /c.txt").await.code(),
            Some(CREATED)
        );
        assert_eq!(run(&state, &mut client, "MOVE / /x").await.code(), Some(400));
    }

    #[tokio::test]
    async fn test_app_scope_on_protocol_requests() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path(), true);
        let mut client = login(&state, "alice", "alice123").await;
        std::fs::create_dir_all(dir.path().join("alice/apps/shop.example")).unwrap();

        // No capabilities presented.
        assert_eq!(run(&state, &mut client, "PROPFIND /apps").await.code(), Some(403));

        run(&state, &mut client, "TOKEN app:shop.example=read,write").await;
        assert_eq!(
            run(&state, &mut client, "PROPFIND /apps").await.code(),
            Some(MULTI_STATUS)
        );
        assert_eq!(run(&state, &mut client, "DELETE /apps").await.code(), Some(403));
        let put = run_with_body(&state, &mut client, "PUT /apps/shop.example/cart.json 2", b"{}").await;
        assert_eq!(put.code(), Some(CREATED));
        assert_eq!(
            run(&state, &mut client, "GET /apps/other.example/x").await.code(),
            Some(403)
        );
        assert_eq!(run(&state, &mut client, "GET /docs/a.txt").await.code(), Some(403));
        assert_eq!(
            run(&state, &mut client, "MOVE /apps/shop.example/cart.json /apps").await.code(),
            Some(403)
        );

        // A malformed token denies even alongside valid ones.
        run(&state, &mut client, "TOKEN app:=read").await;
        assert_eq!(
            run(&state, &mut client, "GET /apps/shop.example/cart.json").await.code(),
            Some(403)
        );
    }

    #[tokio::test]
    async fn test_share_and_public_link_commands() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path(), false);
        let mut alice = login(&state, "alice", "alice123").await;
        let mut bob = login(&state, "bob", "bob123").await;

        run(&state, &mut alice, "MKCOL /projects").await;
        run_with_body(&state, &mut alice, "PUT /projects/plan.txt 4", b"plan").await;

        let share = run(&state, &mut alice, "SHARE /projects bob read,create").await;
        assert_eq!(share.code(), Some(CREATED));
        let id = share.text().unwrap();

        let get = run(&state, &mut bob, &format!("SHARED GET {} plan.txt", id)).await;
        assert_eq!(get.data.as_deref(), Some(&b"plan"[..]));
        let escape = run(&state, &mut bob, &format!("SHARED GET {} ../../etc/passwd", id)).await;
        assert_eq!(escape.code(), Some(400));
        let put = run_with_body(&state, &mut bob, &format!("SHARED PUT {} new.txt 2", id), b"hi").await;
        assert_eq!(put.code(), Some(CREATED));
        let delete = run(&state, &mut bob, &format!("SHARED DELETE {} new.txt", id)).await;
        assert_eq!(delete.code(), Some(403));

        let link = run(&state, &mut alice, "LINK /projects/plan.txt read").await;
        let token = link.text().unwrap().split(' ').nth(1).unwrap().to_string();
        let mut anonymous = Client::default();
        let public = run(&state, &mut anonymous, &format!("PUBLIC GET {} plan.txt", token)).await;
        assert_eq!(public.data.as_deref(), Some(&b"plan"[..]));

        let past = run(
            &state,
            &mut alice,
            "LINK /projects/plan.txt read 2000-01-01T00:00:00Z",
        )
        .await;
        assert_eq!(past.code(), Some(400));
    }

    #[tokio::test]
    async fn test_shares_honor_app_scope() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path(), true);
        let mut alice = login(&state, "alice", "alice123").await;
        let mut bob = login(&state, "bob", "bob123").await;
        std::fs::create_dir_all(dir.path().join("alice/apps/shop.example")).unwrap();
        std::fs::write(dir.path().join("alice/apps/shop.example/cart.json"), b"{}").unwrap();

        run(&state, &mut alice, "TOKEN app:shop.example=read").await;
        let share = run(&state, &mut alice, "SHARE /apps/shop.example bob read,write").await;
        assert_eq!(share.code(), Some(403));
        let share = run(&state, &mut alice, "SHARE /apps/shop.example bob read").await;
        assert_eq!(share.code(), Some(CREATED));
        let id = share.text().unwrap().to_string();

        // Without an app token the recipient is refused like on its own tree.
        assert_eq!(run(&state, &mut bob, "GET /apps/shop.example/x").await.code(), Some(403));
        let get = run(&state, &mut bob, &format!("SHARED GET {} cart.json", id)).await;
        assert_eq!(get.code(), Some(403));
        let put = run_with_body(&state, &mut bob, &format!("SHARED PUT {} new.json 2", id), b"{}").await;
        assert_eq!(put.code(), Some(403));
        let delete = run(&state, &mut bob, &format!("SHARED DELETE {} cart.json", id)).await;
        assert_eq!(delete.code(), Some(403));
        assert_eq!(run(&state, &mut bob, "SHARES").await.code(), Some(403));
        assert!(dir.path().join("alice/apps/shop.example/cart.json").is_file());

        run(&state, &mut bob, "TOKEN app:shop.example=read").await;
        let get = run(&state, &mut bob, &format!("SHARED GET {} cart.json", id)).await;
        assert_eq!(get.data.as_deref(), Some(&b"{}"[..]));
        let shares = run(&state, &mut bob, "SHARES").await;
        assert_eq!(shares.text(), Some("1"));

        let mut unscoped = login(&state, "alice", "alice123").await;
        assert_eq!(
            run(&state, &mut unscoped, &format!("UNSHARE {}", id)).await.code(),
            Some(403)
        );
        assert_eq!(
            run(&state, &mut alice, &format!("UNSHARE {}", id)).await.code(),
            Some(NO_CONTENT)
        );
    }
}
