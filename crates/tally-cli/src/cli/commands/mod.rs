use std::sync::Arc;

use tally_client::{
    CacheConfig, ClientConfig, ExpenseClient, ExpenseService, MutationConfig, QueryCache,
};

use super::args::{Cli, Command, GlobalArgs};

pub mod mutate;
pub mod query;

/// Service handle and cache shared by every command.
pub(crate) struct Context {
    pub(crate) service: Arc<dyn ExpenseService>,
    pub(crate) cache: Arc<QueryCache>,
    pub(crate) mutation: MutationConfig,
}

impl Context {
    pub(crate) fn from_args(global: &GlobalArgs) -> anyhow::Result<Self> {
        let mut config = ClientConfig::from_env();
        if let Some(url) = &global.url {
            config = config.with_url(url.clone());
        }
        if let Some(token) = &global.token {
            config = config.with_token(token.clone());
        }

        let mutation = if global.no_delay {
            MutationConfig::immediate()
        } else {
            MutationConfig::from_env()
        };

        Ok(Self {
            service: Arc::new(ExpenseClient::new(config)?),
            cache: Arc::new(QueryCache::new(CacheConfig::from_env())),
            mutation,
        })
    }
}

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    let ctx = Context::from_args(&cli.global)?;

    match cli.cmd {
        Command::List => query::list(&ctx).await,
        Command::Total => query::total(&ctx).await,
        Command::Whoami => query::whoami(&ctx).await,
        Command::Add(args) => mutate::add(&ctx, args).await,
        Command::Delete(args) => mutate::delete(&ctx, args).await,
    }
}
