use std::env;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use libris::config::CONFIG;
use libris::constants::NOTIFICATION_POLL_INTERVAL;
use libris::core::models::TransactionStatus;
use libris::{
    CatalogService, FileTokenStore, HttpApi, LibraryApi, LibraryError, Session, SessionState,
    TransactionService, poller,
};
use tracing::info;

fn usage() -> ! {
    eprintln!(
        "usage: libris <command>\n\
         \n\
         commands:\n\
           login <email> <password>     sign in and persist the token\n\
           logout                       clear the persisted token\n\
           whoami                       show the current profile\n\
           books                        list the catalog\n\
           transactions [status]        show the transaction view\n\
           borrow <book-id>             borrow a book\n\
           return <transaction-id>      request a return\n\
           renew <transaction-id>       renew an active loan\n\
           approve <transaction-id>     approve a pending return (staff)\n\
           reject <transaction-id> [reason]\n\
                                        reject a pending return (staff)\n\
           notifications                list notifications\n\
           watch                        poll unread notifications until Ctrl-C"
    );
    std::process::exit(2);
}

type Shell = (
    Arc<HttpApi>,
    Arc<Session<HttpApi, FileTokenStore>>,
);

fn build_shell() -> Shell {
    let api = Arc::new(HttpApi::new(
        CONFIG.api_base_url.clone(),
        Duration::from_secs(CONFIG.aux_timeout_secs),
    ));
    let session = Arc::new(Session::new(
        Arc::clone(&api),
        FileTokenStore::new(&CONFIG.token_path),
    ));
    (api, session)
}

/// Restores the session from the persisted token and returns the signed-in
/// user, translating the two failure modes into shell-friendly errors.
async fn require_session(
    session: &Session<HttpApi, FileTokenStore>,
) -> Result<(String, libris::core::models::User), Box<dyn Error>> {
    if let Some(redirect) = session.initialize().await? {
        return Err(format!("{} ({})", redirect.message, redirect.code).into());
    }
    match session.state().await {
        SessionState::Authenticated(user) => {
            let token = session.token().await.ok_or(LibraryError::Unauthenticated)?;
            Ok((token, user))
        }
        _ => Err(LibraryError::Unauthenticated.into()),
    }
}

fn parse_status(raw: &str) -> Option<TransactionStatus> {
    match raw {
        "active" => Some(TransactionStatus::Active),
        "pending" | "pending_return_approval" => Some(TransactionStatus::PendingReturnApproval),
        "completed" => Some(TransactionStatus::Completed),
        "cancelled" => Some(TransactionStatus::Cancelled),
        "overdue" => Some(TransactionStatus::Overdue),
        _ => None,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(CONFIG.log_level.as_str())
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or_else(|| usage());

    let (api, session) = build_shell();

    match command {
        "login" => {
            let (email, password) = match (args.get(1), args.get(2)) {
                (Some(e), Some(p)) => (e, p),
                _ => usage(),
            };
            let user = session.login(email, password).await?;
            println!("Welcome, {} ({})", user.name, user.role);
        }
        "logout" => {
            session.logout().await;
            println!("Logged out");
        }
        "whoami" => {
            let (_, user) = require_session(&session).await?;
            println!("{} <{}> role={}", user.name, user.email, user.role);
        }
        "books" => {
            session.initialize().await?;
            let catalog = CatalogService::new(Arc::clone(&api));
            let token = session.token().await;
            for book in catalog.list_books(token.as_deref()).await? {
                println!(
                    "{}  {} by {}  [{:?}]",
                    book.id,
                    book.title,
                    book.author,
                    book.availability()
                );
            }
        }
        "transactions" => {
            let (token, user) = require_session(&session).await?;
            let service = TransactionService::new(Arc::clone(&api));
            service.refresh(&token, &user).await?;
            let visible = match args.get(1) {
                Some(raw) => {
                    let status = parse_status(raw).unwrap_or_else(|| usage());
                    service.set_status_filter(Some(status)).await
                }
                None => service.visible_transactions().await,
            };
            if visible.is_empty() {
                println!("No transactions");
            }
            for t in &visible {
                let title = t.book.as_ref().map(|b| b.title.as_str()).unwrap_or("?");
                let due = t
                    .due_date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!("{}  {:?}  {}  due {}", t.id, t.status, title, due);
            }
            if let Some(prompt) = service.take_rating_prompt().await {
                println!(
                    "A return just completed: rate book {} (loan {})",
                    prompt.book_id, prompt.transaction_id
                );
            }
        }
        "borrow" | "return" | "renew" | "approve" | "reject" => {
            let id = args.get(1).map(String::as_str).unwrap_or_else(|| usage());
            let (token, user) = require_session(&session).await?;
            let service = TransactionService::new(Arc::clone(&api));
            if command != "borrow" {
                // Seed the advisory cache so renewal-window checks see state.
                service.refresh(&token, &user).await?;
            }
            let result = match command {
                "borrow" => service.borrow(&token, &user, id).await,
                "return" => service.return_book(&token, &user, id).await,
                "renew" => service.renew(&token, &user, id).await,
                "approve" => service.approve_return(&token, &user, id).await,
                "reject" => {
                    service
                        .reject_return(&token, &user, id, args.get(2).map(String::as_str))
                        .await
                }
                _ => unreachable!(),
            };
            match result {
                Ok(t) => println!("{}: now {:?}", t.id, t.status),
                // Workflow rejections are messages, not crashes.
                Err(e) => println!("{e}"),
            }
            if let Some(prompt) = service.take_rating_prompt().await {
                println!(
                    "Return approved: rate book {} (loan {})",
                    prompt.book_id, prompt.transaction_id
                );
            }
        }
        "notifications" => {
            let (token, _) = require_session(&session).await?;
            let unread = api.unread_count(&token).await.unwrap_or(0);
            println!("{unread} unread");
            for n in api.notifications(&token).await? {
                let marker = if n.read { " " } else { "*" };
                println!("{marker} {}  {}", n.title, n.message);
            }
        }
        "watch" => {
            let (token, user) = require_session(&session).await?;
            info!(user_id = %user.id, "watching notifications");
            let handle = poller::spawn(Arc::clone(&api), token, NOTIFICATION_POLL_INTERVAL);
            let mut updates = handle.subscribe();
            println!("{} unread", handle.unread());
            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    changed = updates.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        println!("{} unread", *updates.borrow());
                    }
                }
            }
            handle.stop().await;
        }
        _ => usage(),
    }

    Ok(())
}
