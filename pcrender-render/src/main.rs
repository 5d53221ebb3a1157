use anyhow::Context;
use clap::Parser;
use log::info;
use pcrender_render::{paint_point_cloud, MitsubaRenderer, RenderArgs, RenderConfig};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = RenderArgs::parse();
    let config = RenderConfig::try_from(args).context("invalid render configuration")?;
    let renderer = MitsubaRenderer::new(config.renderer(), config.variant());

    let outcome = paint_point_cloud(&config, &renderer)
        .with_context(|| format!("failed to render dataset '{}'", config.name()))?;

    info!(
        "{} points, {} box edges -> {}",
        outcome.points,
        outcome.box_edges,
        outcome.image.display()
    );
    Ok(())
}
