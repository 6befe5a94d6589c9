pub mod examples;
pub mod full_doc;
pub mod refresh;
pub mod search_docs;
pub mod sections;
pub mod utility_class;
pub mod variant;

pub use examples::*;
pub use full_doc::*;
pub use refresh::*;
pub use search_docs::*;
pub use sections::*;
pub use utility_class::*;
pub use variant::*;
