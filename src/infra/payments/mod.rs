pub mod stripe_provider;
