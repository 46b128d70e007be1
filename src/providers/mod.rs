// Source providers: ranked geographic search backends.

pub mod geoapify;
pub mod google_places;
pub mod nominatim;
pub mod traits;

pub use geoapify::GeoapifyProvider;
pub use google_places::GooglePlacesProvider;
pub use nominatim::NominatimProvider;
pub use traits::SourceProvider;
