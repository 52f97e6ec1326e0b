pub mod isochrone_server;
