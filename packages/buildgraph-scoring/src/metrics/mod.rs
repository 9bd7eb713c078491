//! The five metric implementations (M1–M5).

mod blast_radius;
mod centrality;
mod credits;
mod cross_package;
mod fanout;

pub use blast_radius::BlastRadius;
pub use centrality::Centrality;
pub use credits::Credits;
pub use cross_package::CrossPackage;
pub use fanout::Fanout;
