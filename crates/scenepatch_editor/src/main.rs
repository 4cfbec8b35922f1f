// SPDX-License-Identifier: MIT OR Apache-2.0
//! `ScenePatch` demo.
//!
//! Builds a one-object scene, wires `time -> sine -> compose_vec3 ->
//! object_transform`, runs a second of frames without a window and writes
//! the graph document to the path given as the first argument.

use scenepatch_editor::{EditorConfig, PatchEditor};
use scenepatch_graph::{builtin_registry, HostEvent, Scene, SceneObject};
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const FRAME_SECONDS: f64 = 1.0 / 60.0;

fn main() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("scenepatch_editor=debug,scenepatch_graph=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting ScenePatch demo v{}", env!("CARGO_PKG_VERSION"));

    let output = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from("scenepatch_demo.json"), PathBuf::from);

    if let Err(e) = run(&output) {
        tracing::error!("Demo failed: {e}");
        std::process::exit(1);
    }
}

fn run(output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let scene = Scene::new().into_shared();
    let cube = scene.write().insert(SceneObject::new("Cube"));

    let mut editor = PatchEditor::new(&EditorConfig::default(), builtin_registry(), scene.clone());
    editor.graph_mut().name = "Bobbing cube".to_string();

    let time = editor.add_node("time", None)?;
    let sine = editor.add_node("sine", None)?;
    let compose = editor.add_node("compose_vec3", None)?;
    let transform = editor.add_node("object_transform", Some(cube))?;

    editor.connect(time, 0, sine, 0)?;
    editor.connect(sine, 0, compose, 1)?;
    editor.connect(compose, 0, transform, 0)?;

    for frame in 0..60 {
        let report = editor.tick(FRAME_SECONDS);
        for (node, error) in &report.failed {
            tracing::warn!(frame, node = %node, "node failed: {error}");
        }
        if frame % 15 == 0 {
            let position = scene.read().get(cube).map(SceneObject::position);
            tracing::info!(frame, ?position, "cube");
        }
    }

    // An external edit flows back into the bound node
    if let Some(object) = scene.write().get_mut(cube) {
        object.set_scale([2.0; 3]);
    }
    editor.handle_host_event(HostEvent::ObjectChanged(cube));
    editor.tick(FRAME_SECONDS);
    tracing::info!(scale = ?editor.graph().output_value(transform, 2), "mirrored scale");

    tracing::info!("{}", editor.canvas().status_text());
    editor.save(output)?;
    Ok(())
}
