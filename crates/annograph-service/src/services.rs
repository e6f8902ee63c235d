//! Service wiring.

use std::sync::Arc;

use annograph_auth::{GraphResourceResolver, PermissionEngine};
use annograph_database::DatabasePool;
use annograph_database::memory::MemoryStore;
use annograph_database::repositories::{
    AnnotationRepository, FolderRepository, ImageRepository, OrganizationRepository,
    UserRepository,
};
use annograph_database::store::{
    AnnotationStore, FolderStore, ImageStore, MembershipStore, OrganizationStore, UserStore,
};
use annograph_graph::{GraphStore, MemoryGraphStore, PgGraphStore};

use crate::annotation::AnnotationService;
use crate::folder::{FolderService, MergeService};
use crate::graph::{NodeService, PermissionPropagator, RelationshipService};
use crate::image::ImageService;
use crate::organization::OrganizationService;

/// Every store the services read and write.
#[derive(Clone)]
pub struct Stores {
    /// Users.
    pub users: Arc<dyn UserStore>,
    /// Organizations and members.
    pub organizations: Arc<dyn OrganizationStore>,
    /// Membership lookups.
    pub membership: Arc<dyn MembershipStore>,
    /// Folders.
    pub folders: Arc<dyn FolderStore>,
    /// Images.
    pub images: Arc<dyn ImageStore>,
    /// Annotations.
    pub annotations: Arc<dyn AnnotationStore>,
    /// The graph.
    pub graph: Arc<dyn GraphStore>,
}

impl Stores {
    /// sqlx repositories over the relational pool plus the graph store.
    pub fn postgres(db: &DatabasePool, graph: PgGraphStore) -> Self {
        let pool = db.pool().clone();
        let organizations = Arc::new(OrganizationRepository::new(pool.clone()));
        Self {
            users: Arc::new(UserRepository::new(pool.clone())),
            organizations: organizations.clone(),
            membership: organizations,
            folders: Arc::new(FolderRepository::new(pool.clone())),
            images: Arc::new(ImageRepository::new(pool.clone())),
            annotations: Arc::new(AnnotationRepository::new(pool)),
            graph: Arc::new(graph),
        }
    }

    /// Process-local stores.
    pub fn in_memory() -> Self {
        Self::with_graph(Arc::new(MemoryGraphStore::new()))
    }

    /// In-memory relational stores with the given graph store.
    pub fn with_graph(graph: Arc<dyn GraphStore>) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            users: store.clone(),
            organizations: store.clone(),
            membership: store.clone(),
            folders: store.clone(),
            images: store.clone(),
            annotations: store,
            graph,
        }
    }
}

/// The full service set, sharing one permission engine.
#[derive(Debug, Clone)]
pub struct Services {
    /// Permission engine.
    pub engine: PermissionEngine,
    /// Folder lifecycle.
    pub folders: Arc<FolderService>,
    /// Merge workflow.
    pub merges: Arc<MergeService>,
    /// Images.
    pub images: Arc<ImageService>,
    /// Annotations.
    pub annotations: Arc<AnnotationService>,
    /// Graph nodes.
    pub nodes: Arc<NodeService>,
    /// Graph relationships.
    pub relationships: Arc<RelationshipService>,
    /// Organizations.
    pub organizations: Arc<OrganizationService>,
    /// Permission propagation and resync.
    pub propagator: PermissionPropagator,
}

impl Services {
    /// Build every service over the stores.
    pub fn new(stores: &Stores) -> Self {
        let resolver =
            GraphResourceResolver::new(Arc::clone(&stores.images), Arc::clone(&stores.folders));
        let engine = PermissionEngine::new(Arc::clone(&stores.membership), resolver);

        let propagator = PermissionPropagator::new(
            Arc::clone(&stores.graph),
            Arc::clone(&stores.images),
            Arc::clone(&stores.folders),
        );

        let images = Arc::new(ImageService::new(
            Arc::clone(&stores.images),
            Arc::clone(&stores.annotations),
            Arc::clone(&stores.folders),
            Arc::clone(&stores.graph),
            engine.clone(),
        ));
        let folders = Arc::new(FolderService::new(
            Arc::clone(&stores.folders),
            Arc::clone(&stores.images),
            Arc::clone(&stores.organizations),
            Arc::clone(&stores.membership),
            Arc::clone(&images),
            engine.clone(),
        ));
        let merges = Arc::new(MergeService::new(
            Arc::clone(&stores.folders),
            Arc::clone(&stores.organizations),
            Arc::clone(&stores.users),
            engine.clone(),
            propagator.clone(),
        ));
        let annotations = Arc::new(AnnotationService::new(
            Arc::clone(&stores.annotations),
            Arc::clone(&stores.images),
            engine.clone(),
        ));
        let nodes = Arc::new(NodeService::new(Arc::clone(&stores.graph), engine.clone()));
        let relationships = Arc::new(RelationshipService::new(
            Arc::clone(&stores.graph),
            engine.clone(),
        ));
        let organizations = Arc::new(OrganizationService::new(
            Arc::clone(&stores.organizations),
            Arc::clone(&stores.users),
            engine.clone(),
        ));

        Self {
            engine,
            folders,
            merges,
            images,
            annotations,
            nodes,
            relationships,
            organizations,
            propagator,
        }
    }
}
