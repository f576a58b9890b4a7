pub mod bert;
