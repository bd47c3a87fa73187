fn main() -> Result<(), eframe::Error> {
    // Set up logging for development
    env_logger::init();

    // Run the funnel builder application
    funnel_builder::run_app()
}
