pub mod setting;

pub use setting::Entity as Setting;
