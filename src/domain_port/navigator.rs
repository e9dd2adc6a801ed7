pub trait Navigator: Send + Sync {
    /// Move the console to `route`. Fire-and-forget.
    fn navigate(&self, route: &str);
}
