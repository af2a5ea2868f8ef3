pub mod location;
pub mod parcel;
pub mod user;
