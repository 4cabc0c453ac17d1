mod helpers;
mod mocks;

mod admin;
mod hearts;
mod profiles;
