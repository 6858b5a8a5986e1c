use anyhow::{Context, Result};
use lumen_core::hdr;
use lumen_core::obj::load_obj;
use lumen_renderer::{render, Camera, Environment, RenderSettings, Scene, Vec3};

/// Usage: `lumen [SCENE.obj] [ENVIRONMENT.hdr] [OUT.hdr]`
///
/// All arguments are positional with defaults; without an environment
/// argument the scene is lit by its emissive geometry alone.
fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let mut args = std::env::args().skip(1);
    let scene_path = args.next().unwrap_or_else(|| "scene.obj".to_string());
    let environment_path = args.next();
    let output_path = args.next().unwrap_or_else(|| "test.hdr".to_string());

    let meshes =
        load_obj(&scene_path).with_context(|| format!("failed to import {scene_path}"))?;

    let mut builder = Scene::builder().add_meshes(meshes);
    if let Some(path) = &environment_path {
        let image =
            hdr::read_hdr(path).with_context(|| format!("failed to read environment {path}"))?;
        builder = builder.with_environment(Environment::new(image));
    }
    let scene = builder.build().context("failed to build scene")?;

    let camera = Camera::new(Vec3::ZERO);
    let settings = RenderSettings::default();
    let image = render(&scene, &camera, &settings);

    hdr::write_hdr(&output_path, &image)
        .with_context(|| format!("failed to write {output_path}"))?;
    log::info!("Wrote {output_path}");
    Ok(())
}
