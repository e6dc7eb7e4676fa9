use std::sync::Arc;

use log::info;
use subreddit_fetch::{
    settings::Settings,
    shaping::{self, LabeledPost},
    BatchCoordinator, ReqwestApiClient,
};

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let settings = Settings::new()?;

    let api_client = ReqwestApiClient::new(
        &settings.api.base_url,
        settings.api.page_size,
        settings.api.request_timeout(),
    )?;
    let coordinator = BatchCoordinator::new(Arc::new(api_client));

    let result = coordinator.run_blocking(settings.fetch.to_request())?;
    let posts = shaping::label_posts(&result, &settings.shaping.text_field, settings.shaping.label);

    info!(
        "Labeled posts. [subreddit = {}, unique_records = {}, kept = {}]",
        settings.fetch.subreddit,
        result.len(),
        posts.len()
    );

    println!("({}, 3)", posts.len());

    if settings.shaping.print_rows {
        print_rows(&posts)?;
    }

    Ok(())
}

fn print_rows(posts: &[LabeledPost]) -> anyhow::Result<()> {
    for post in posts {
        println!("{}", serde_json::to_string(post)?);
    }

    Ok(())
}
