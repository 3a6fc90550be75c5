pub mod activity;
pub mod image;
pub mod itinerary;
pub mod place;
pub mod trip_request;
