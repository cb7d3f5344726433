//! Placement Demo - Headless Session Walkthrough
//!
//! Drives the building system with scripted input: a crate is placed as its
//! own set, a foundation follows the pointer onto the grid, and a path is
//! drawn between two clicks. Session events and scene state are logged.
//!
//! Run with: `RUST_LOG=debug cargo run --bin placement-demo`
//!
//! Optional arguments:
//! - `--catalog <file>`: piece catalog JSON (defaults to the built-in pieces)
//! - `--config <file>`: placement config JSON, partial documents allowed

use std::path::Path;

use glam::Vec3;
use log::{error, info};

use modular_builder_engine::game::collab::Collaborators;
use modular_builder_engine::game::{
    BuildingSystem, ConnectionDirection, EntityKind, PieceCatalog, PieceDefinition, PlacementConfig, StrokeCategory,
    StrokeType,
};
use modular_builder_engine::input::{InputState, KeyCode, PointerSample};

const FRAME: f32 = 1.0 / 60.0;

fn builtin_catalog() -> PieceCatalog {
    use ConnectionDirection::*;
    let path = Vec3::new(1.0, 0.1, 1.0);
    let connector = |id: &str, archetype, dirs| {
        PieceDefinition::connector(id, StrokeCategory::Path, archetype, dirs, path).with_price(1)
    };
    PieceCatalog::new()
        .with(PieceDefinition::new("crate", EntityKind::Static, Vec3::ONE).with_price(5))
        .with(PieceDefinition::new("foundation", EntityKind::Core, Vec3::new(2.0, 0.5, 2.0)).with_price(20))
        .with(connector("path_end", StrokeType::End, vec![Front]))
        .with(connector("path_turn", StrokeType::Turn, vec![Front, Right]))
        .with(connector("path_straight", StrokeType::Straight, vec![Front, Back]))
        .with(connector("path_three_way", StrokeType::ThreeWay, vec![Front, Back, Right]))
        .with(connector("path_cross", StrokeType::Cross, vec![Front, Back, Left, Right]))
}

fn arg_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

/// Hover, press and release the confirm button at `at`.
fn click(system: &mut BuildingSystem, input: &mut InputState, at: Vec3) {
    input.set_pointer(PointerSample::at(at));
    system.update(input, FRAME);
    input.end_frame();
    input.handle_key(KeyCode::MouseLeft, true);
    system.update(input, FRAME);
    input.end_frame();
    input.handle_key(KeyCode::MouseLeft, false);
    system.update(input, FRAME);
    input.end_frame();
}

fn press(system: &mut BuildingSystem, input: &mut InputState, key: KeyCode) {
    input.handle_key(key, true);
    system.update(input, FRAME);
    input.end_frame();
    input.handle_key(key, false);
    system.update(input, FRAME);
    input.end_frame();
}

fn report(system: &mut BuildingSystem) {
    for event in system.drain_events() {
        info!("[Demo] {:?}", event);
    }
    info!(
        "[Demo] {:?}: {} entities, balance {}",
        system.state(),
        system.scene().len(),
        system.session().services().economy.balance()
    );
}

fn run() -> modular_builder_engine::game::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let catalog = match arg_value(&args, "--catalog") {
        Some(file) => PieceCatalog::from_json_str(&std::fs::read_to_string(file)?)?,
        None => builtin_catalog(),
    };
    let config = match arg_value(&args, "--config") {
        Some(file) => PlacementConfig::load(Path::new(&file))?,
        None => PlacementConfig::default(),
    };

    let mut system = BuildingSystem::new(catalog, Collaborators::in_memory(100), config);
    let mut input = InputState::new();

    info!("[Demo] Placing a crate as a set");
    system.place_piece_as_set("crate", Vec3::ZERO)?;
    click(&mut system, &mut input, Vec3::new(2.3, 0.0, 1.7));
    press(&mut system, &mut input, KeyCode::Escape);
    report(&mut system);

    info!("[Demo] Placing a foundation on the grid");
    system.place_piece_as_set("foundation", Vec3::ZERO)?;
    click(&mut system, &mut input, Vec3::new(6.4, 0.0, 3.1));
    press(&mut system, &mut input, KeyCode::Escape);
    report(&mut system);

    info!("[Demo] Drawing a path");
    system.stroke_placable(StrokeCategory::Path)?;
    click(&mut system, &mut input, Vec3::new(-4.0, 0.0, -4.0));
    click(&mut system, &mut input, Vec3::new(-4.0, 0.0, 0.0));
    press(&mut system, &mut input, KeyCode::Escape);
    report(&mut system);

    for entity in system.scene().iter() {
        info!(
            "[Demo] {} {:?} `{}` at {:?}",
            entity.id,
            entity.kind,
            entity.piece_id.as_deref().unwrap_or("-"),
            system.scene().world_position(entity.id).unwrap_or_default()
        );
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(err) = run() {
        error!("[Demo] {}", err);
        std::process::exit(1);
    }
}
