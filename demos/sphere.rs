use bevy::{
    pbr::wireframe::{Wireframe, WireframeConfig},
    prelude::*,
};
use isofield::{EdgePlacement, GridBounds, IsoMeshPlugin, field::Sphere, plugin::IsoVolume};

fn main() {
    App::new()
        .add_plugins((
            DefaultPlugins,
            bevy::pbr::wireframe::WireframePlugin::default(),
            IsoMeshPlugin::default(),
        ))
        .insert_resource(WireframeConfig {
            global: true,
            ..Default::default()
        })
        .add_systems(Startup, setup)
        .run();
}

fn setup(mut commands: Commands) {
    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(-3.0, 3.5, -3.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    // x² + y² + z² = 1: the unit sphere.
    commands.spawn((
        IsoVolume::from_field(&Sphere, GridBounds::new(-2.0, 2.0, 0.125))
            .with_isovalue(1.0)
            .with_placement(EdgePlacement::Interpolated),
        Wireframe,
    ));
}
