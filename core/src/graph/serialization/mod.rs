pub mod xgmml;
