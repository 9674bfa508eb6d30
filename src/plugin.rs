use std::sync::Arc;

use bevy::{
    asset::RenderAssetUsages,
    mesh::{Indices, PrimitiveTopology},
    prelude::*,
    tasks::{AsyncComputeTaskPool, Task, block_on, futures_lite::future},
};

use crate::{
    extract::{EdgePlacement, extract_sampled},
    field::ScalarField,
    grid::{GridBounds, SampledGrid},
    mesh::IsoMesh,
    types::Value,
};

/// A volume of space whose isosurface should be meshed.
///
/// Holds the corner samples of a scalar field over a [`GridBounds`] lattice.
/// The samples are captured when the component is built, so the field itself
/// never has to cross a thread boundary; the async extraction task only
/// needs the [`Arc`]ed grid.
#[derive(Component)]
#[require(Transform)]
pub struct IsoVolume {
    /// Presampled corner values.
    pub grid: Arc<SampledGrid>,
    /// Field value the surface traces.
    pub isovalue: Value,
    /// Vertex placement rule along crossed edges.
    pub placement: EdgePlacement,
}

impl IsoVolume {
    /// Samples `field` over `bounds` and queues the volume for meshing with
    /// an isovalue of `0.0`.
    pub fn from_field<F>(field: &F, bounds: GridBounds) -> Self
    where
        F: ScalarField + ?Sized,
    {
        Self {
            grid: Arc::new(SampledGrid::from_field(field, bounds)),
            isovalue: 0.0,
            placement: EdgePlacement::default(),
        }
    }

    /// Reuses previously captured samples, e.g. from a despawned volume.
    pub fn from_grid(grid: Arc<SampledGrid>) -> Self {
        Self {
            grid,
            isovalue: 0.0,
            placement: EdgePlacement::default(),
        }
    }

    /// Sets the isovalue the surface traces.
    pub fn with_isovalue(mut self, isovalue: Value) -> Self {
        self.isovalue = isovalue;
        self
    }

    /// Sets the edge placement rule.
    pub fn with_placement(mut self, placement: EdgePlacement) -> Self {
        self.placement = placement;
        self
    }
}

/// System sets for the isosurface meshing pipeline.
///
/// Use these to order your own systems relative to mesh generation:
///
/// ```rust,ignore
/// // Run after geometry is ready but before it's uploaded, e.g. for collider generation:
/// app.add_systems(Update, build_collider.after(IsoMeshSet::Generate)
///                                       .before(IsoMeshSet::Upload));
/// ```
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum IsoMeshSet {
    /// Spawns an async extraction task for each queued volume.
    Spawn,
    /// Polls async tasks and inserts [`ExtractedMesh`] on completion.
    Generate,
    /// Uploads [`ExtractedMesh`] data into a Bevy [`Mesh3d`] and removes it.
    Upload,
}

/// Marker component added to [`IsoVolume`] entities waiting to be processed.
///
/// Removed automatically once the volume's mesh has been generated and
/// uploaded.
#[derive(Component)]
pub struct QueuedVolume;

/// Holds the in-flight async extraction task for an [`IsoVolume`].
#[derive(Component)]
pub struct ExtractTask(Task<IsoMesh>);

/// Extraction result, available between [`IsoMeshSet::Generate`] and
/// [`IsoMeshSet::Upload`] for systems that want the raw buffers (colliders,
/// [PLY export](crate::ply::write_ply), analysis).
#[derive(Component)]
pub struct ExtractedMesh(pub IsoMesh);

/// Runtime configuration for the isosurface meshing pipeline.
#[derive(Resource)]
pub struct IsoMeshConfig {
    /// Maximum number of async extraction tasks spawned per frame.
    ///
    /// Higher values mesh queued volumes faster but may cause frame hitches
    /// when many are queued at once. Default: `4`.
    pub max_tasks_per_frame: usize,
}

impl Default for IsoMeshConfig {
    fn default() -> Self {
        Self {
            max_tasks_per_frame: 4,
        }
    }
}

/// Bevy plugin that drives isosurface mesh generation.
///
/// When the `auto_queue` feature is enabled, any [`IsoVolume`] added to the
/// world is automatically processed. Extraction runs on Bevy's
/// `AsyncComputeTaskPool` so the main thread is never blocked:
///
/// ```text
/// IsoVolume added
///   → QueuedVolume inserted        (on_volume_add)
///   → ExtractTask spawned          (IsoMeshSet::Spawn)
///   → [async extraction runs]
///   → ExtractedMesh inserted       (IsoMeshSet::Generate, once task completes)
///   → [your collider/export systems here]
///   → Mesh3d inserted              (IsoMeshSet::Upload)
///   → QueuedVolume + ExtractedMesh removed
/// ```
pub struct IsoMeshPlugin {
    /// Initial value for [`IsoMeshConfig::max_tasks_per_frame`].
    pub max_tasks_per_frame: usize,
}

impl Default for IsoMeshPlugin {
    fn default() -> Self {
        Self {
            max_tasks_per_frame: IsoMeshConfig::default().max_tasks_per_frame,
        }
    }
}

impl Plugin for IsoMeshPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(IsoMeshConfig {
            max_tasks_per_frame: self.max_tasks_per_frame,
        });

        #[cfg(feature = "auto_queue")]
        app.configure_sets(
            Update,
            (IsoMeshSet::Spawn, IsoMeshSet::Generate, IsoMeshSet::Upload).chain(),
        )
        .add_systems(
            Update,
            (
                on_volume_add,
                spawn_extract_tasks.in_set(IsoMeshSet::Spawn),
                poll_extract_tasks.in_set(IsoMeshSet::Generate),
                upload_meshes.in_set(IsoMeshSet::Upload),
            ),
        );
    }
}

/// Inserts [`QueuedVolume`] on every newly added [`IsoVolume`].
fn on_volume_add(
    mut commands: Commands,
    query: Query<Entity, (Added<IsoVolume>, Without<QueuedVolume>)>,
) {
    for entity in query.iter() {
        commands.entity(entity).insert(QueuedVolume);
    }
}

/// Spawns async extraction tasks for [`QueuedVolume`]s, up to
/// [`IsoMeshConfig::max_tasks_per_frame`] per frame.
fn spawn_extract_tasks(
    mut commands: Commands,
    config: Res<IsoMeshConfig>,
    query: Query<(Entity, &IsoVolume), (With<QueuedVolume>, Without<ExtractTask>, Without<Mesh3d>)>,
) {
    let task_pool = AsyncComputeTaskPool::get();

    for (entity, volume) in query.iter().take(config.max_tasks_per_frame) {
        let grid = Arc::clone(&volume.grid);
        let isovalue = volume.isovalue;
        let placement = volume.placement;

        let task = task_pool.spawn(async move { extract_sampled(&grid, isovalue, placement) });

        commands.entity(entity).insert(ExtractTask(task));
    }
}

/// Polls in-flight [`ExtractTask`]s each frame and inserts [`ExtractedMesh`]
/// on completion.
///
/// Non-blocking: tasks that haven't finished are skipped and retried next
/// frame.
fn poll_extract_tasks(mut commands: Commands, mut query: Query<(Entity, &mut ExtractTask)>) {
    for (entity, mut task) in query.iter_mut() {
        if let Some(mesh) = block_on(future::poll_once(&mut task.0)) {
            commands
                .entity(entity)
                .insert(ExtractedMesh(mesh))
                .remove::<ExtractTask>();
        }
    }
}

/// Uploads an [`ExtractedMesh`] into a Bevy [`Mesh3d`], then removes
/// [`ExtractedMesh`] and [`QueuedVolume`].
fn upload_meshes(
    mut commands: Commands,
    query: Query<(Entity, &ExtractedMesh), With<QueuedVolume>>,
    mut meshes: ResMut<Assets<Mesh>>,
) {
    for (entity, extracted) in query.iter() {
        let mut bevy_mesh = Mesh::new(
            PrimitiveTopology::TriangleList,
            RenderAssetUsages::RENDER_WORLD,
        );

        bevy_mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, extracted.0.vertices.clone());
        bevy_mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, extracted.0.normals.clone());
        bevy_mesh.insert_indices(Indices::U32(extracted.0.indices.clone()));

        commands
            .entity(entity)
            .insert(Mesh3d(meshes.add(bevy_mesh)))
            .remove::<ExtractedMesh>()
            .remove::<QueuedVolume>();
    }
}
