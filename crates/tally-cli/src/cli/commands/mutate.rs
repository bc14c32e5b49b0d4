//! `add` and `delete`: run the mutation while a watcher re-renders the view
//! on every cache change.

use std::sync::Arc;

use tally_client::{
    project_cache, ChannelNotifier, CreateExpenseInput, ExpenseView, MutationController,
    Notification, QueryCache, QueryKey,
};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

use super::Context;
use crate::cli::args::{AddArgs, DeleteArgs};
use crate::exit_codes::SUCCESS;
use crate::render;

pub async fn add(ctx: &Context, args: AddArgs) -> anyhow::Result<i32> {
    let date = args
        .date
        .unwrap_or_else(|| chrono::Utc::now().format("%Y-%m-%d").to_string());
    let mut input = CreateExpenseInput::new(args.title, args.amount, date);
    if let Some(group) = args.group {
        input = input.with_group(group);
    }

    let (controller, mut notifications) = controller(ctx);
    let watcher = Watcher::spawn(ctx.cache.clone());

    let result = controller.create_expense(input).await;
    watcher.finish().await;
    print_notifications(&mut notifications);

    match result {
        Ok(expense) => {
            debug!(id = expense.id, "create settled");
            Ok(SUCCESS)
        }
        Err(e) => {
            eprintln!("error: {e}");
            Ok(e.exit_code())
        }
    }
}

pub async fn delete(ctx: &Context, args: DeleteArgs) -> anyhow::Result<i32> {
    // Delete never fetches; load the list so there is something to remove from.
    if let Err(e) = ctx.cache.query_expenses(ctx.service.as_ref()).await {
        eprintln!("error: {e}");
        return Ok(e.exit_code());
    }
    print!("{}", render::view(&project_cache(&ctx.cache)));
    println!("deleting #{} ...", args.id);

    let (controller, mut notifications) = controller(ctx);
    let watcher = Watcher::spawn(ctx.cache.clone());

    let result = controller.delete_expense(args.id).await;
    watcher.finish().await;
    print_notifications(&mut notifications);

    match result {
        Ok(()) => Ok(SUCCESS),
        Err(e) => {
            eprintln!("error: {e}");
            Ok(e.exit_code())
        }
    }
}

fn controller(ctx: &Context) -> (MutationController, mpsc::UnboundedReceiver<Notification>) {
    let (notifier, rx) = ChannelNotifier::new();
    let controller = MutationController::new(
        ctx.service.clone(),
        ctx.cache.clone(),
        Arc::new(notifier),
        ctx.mutation.clone(),
    );
    (controller, rx)
}

fn print_notifications(rx: &mut mpsc::UnboundedReceiver<Notification>) {
    while let Ok(n) = rx.try_recv() {
        if n.kind.is_failure() {
            eprintln!("{}: {}", n.title, n.description);
        } else {
            println!("{}: {}", n.title, n.description);
        }
    }
}

/// Re-projects and prints the view whenever the list or the placeholder
/// changes. Identical consecutive views are printed once.
struct Watcher {
    stop: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl Watcher {
    fn spawn(cache: Arc<QueryCache>) -> Self {
        let mut changes = cache.subscribe();
        let (stop, mut stopped) = oneshot::channel();

        let handle = tokio::spawn(async move {
            let mut last: Option<ExpenseView> = None;
            loop {
                tokio::select! {
                    // Drain queued changes before honouring stop.
                    biased;
                    change = changes.recv() => match change {
                        Ok(QueryKey::AllExpenses | QueryKey::PendingCreate) => {}
                        Ok(_) => continue,
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            debug!(skipped = n, "view watcher lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    _ = &mut stopped => break,
                }

                let view = project_cache(&cache);
                if last.as_ref() != Some(&view) {
                    println!("{}", render::view(&view));
                    last = Some(view);
                }
            }
        });

        Self { stop, handle }
    }

    async fn finish(self) {
        let _ = self.stop.send(());
        if let Err(e) = self.handle.await {
            debug!(error = %e, "view watcher ended abnormally");
        }
    }
}
