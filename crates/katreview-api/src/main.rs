use katreview_core::Config;

// Use mimalloc as the global allocator; image decoding churns through large buffers.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env()?;

    let (_state, router) = katreview_api::initialize_app(config.clone()).await?;

    katreview_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
