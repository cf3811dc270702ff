pub mod catalogs;
pub mod debounce;
pub mod error;
pub mod events;
pub mod filters;
pub mod list_loader;
pub mod preferences;
pub mod product_filter;
pub mod query_state;
pub mod reconciler;
pub mod reorder;
pub mod session;
pub mod transport;

pub use debounce::{DebouncePolicy, DEFAULT_DEBOUNCE};
pub use error::{ClientError, PersistError, QueryError, ReorderError};
pub use events::ScreenEvent;
pub use filters::{FilterCatalog, FilterChip, FilterSpec, Resolver};
pub use list_loader::{ListFetcher, ListLoader, ListState, LoadOutcome};
pub use preferences::ScreenPreferences;
pub use product_filter::{DraftFilter, ProductFilter, ProductFilterState};
pub use query_state::QueryController;
pub use reconciler::{MoveOutcome, OrderedCollection, PersistMode, PositionStore, ReconcilerState};
pub use reorder::{OrderedItem, PositionKey};
pub use session::ListSession;
pub use transport::{AdminApiClient, CategoryProductPositions, ClientConfig, Resource};
