pub mod uploads;

pub use uploads::Entity as Uploads;
