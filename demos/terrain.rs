use bevy::prelude::*;
use bevy_infinite_grid::{InfiniteGridBundle, InfiniteGridPlugin, InfiniteGridSettings};
use bevy_panorbit_camera::{PanOrbitCamera, PanOrbitCameraPlugin};
use isofield::{GridBounds, IsoMeshPlugin, plugin::IsoVolume};
use noiz::prelude::*;

fn main() {
    App::new()
        .add_plugins((
            DefaultPlugins,
            IsoMeshPlugin::default(),
            PanOrbitCameraPlugin,
            InfiniteGridPlugin,
            #[cfg(not(target_arch = "wasm32"))]
            bevy::pbr::wireframe::WireframePlugin::default(),
        ))
        .add_systems(Startup, setup)
        .add_systems(Update, spawn_volumes)
        .run();
}

fn setup(mut commands: Commands) {
    commands.spawn(InfiniteGridBundle {
        settings: InfiniteGridSettings {
            fadeout_distance: 1000.0,
            ..Default::default()
        },
        ..Default::default()
    });

    commands.spawn((
        Camera3d::default(),
        PanOrbitCamera {
            button_orbit: MouseButton::Right,
            button_pan: MouseButton::Middle,
            ..default()
        },
        Transform::from_xyz(30., 60., 30.).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.spawn((
        DirectionalLight {
            illuminance: light_consts::lux::FULL_DAYLIGHT,
            ..Default::default()
        },
        Transform::default().with_rotation(Quat::from_rotation_x(-45.0_f32.to_radians())),
    ));
}

/// Press Space to mesh a new noise volume.
fn spawn_volumes(
    mut commands: Commands,
    mut materials: ResMut<Assets<StandardMaterial>>,
    keyboard: Res<ButtonInput<KeyCode>>,
) {
    if keyboard.just_pressed(KeyCode::Space) {
        let mut noise = Noise::<
            LayeredNoise<
                Normed<f32>,
                Persistence,
                Octave<MixCellGradients<OrthoGrid, Smoothstep, QuickGradients>>,
            >,
        >::default();
        noise.set_frequency(0.06);

        let field = |x: f32, y: f32, z: f32| {
            // Bias by height so the surface reads as rolling terrain.
            let v: f32 = noise.sample_for(Vec3::new(x, y, z));
            v + y * 0.04
        };

        commands.spawn((
            IsoVolume::from_field(&field, GridBounds::new(-32.0, 32.0, 1.0)),
            MeshMaterial3d(materials.add(StandardMaterial {
                base_color: Color::srgb(0.4, 0.6, 0.3),
                ..Default::default()
            })),
        ));
    }
}
