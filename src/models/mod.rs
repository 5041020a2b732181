// Models module - Database entity representations

pub mod access_key;
pub mod advertisement;
pub mod brain_teaser;
pub mod course;
pub mod image;
pub mod package;
pub mod processing_job;
pub mod product;
pub mod transaction;
pub mod user;
pub mod withdrawal;

pub use access_key::AccessKey;
pub use advertisement::Advertisement;
pub use brain_teaser::BrainTeaser;
pub use course::Course;
pub use image::Image;
pub use package::Package;
pub use processing_job::ProcessingJob;
pub use product::Product;
pub use transaction::Transaction;
pub use user::User;
pub use withdrawal::WithdrawalRequest;
