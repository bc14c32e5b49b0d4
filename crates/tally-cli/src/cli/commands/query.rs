use tally_client::{project_cache, SessionProvider};

use super::Context;
use crate::exit_codes::SUCCESS;
use crate::render;

pub async fn list(ctx: &Context) -> anyhow::Result<i32> {
    if let Err(e) = ctx.cache.query_expenses(ctx.service.as_ref()).await {
        eprintln!("error: {e}");
        return Ok(e.exit_code());
    }

    print!("{}", render::view(&project_cache(&ctx.cache)));
    Ok(SUCCESS)
}

pub async fn total(ctx: &Context) -> anyhow::Result<i32> {
    match ctx.cache.query_total(ctx.service.as_ref()).await {
        Ok(total) => {
            println!("{}", render::total(&total));
            Ok(SUCCESS)
        }
        Err(e) => {
            eprintln!("error: {e}");
            Ok(e.exit_code())
        }
    }
}

pub async fn whoami(ctx: &Context) -> anyhow::Result<i32> {
    let session = SessionProvider::new(ctx.service.clone(), ctx.cache.clone());
    let user = session.current_user().await;

    println!("{}", render::user(user.as_ref().map(|u| &u.user)));
    Ok(SUCCESS)
}
