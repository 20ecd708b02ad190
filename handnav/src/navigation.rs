//! Navigation destinations and the sink that performs view transitions.

/// Views reachable by gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Destination {
    Dashboard,
    Theory,
    Practice,
}

impl Destination {
    /// Opaque identifier handed to the router.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Theory => "theory",
            Self::Practice => "practice",
        }
    }

    /// Route path used by the web client.
    pub fn route(&self) -> &'static str {
        match self {
            Self::Dashboard => "/dashboard",
            Self::Theory => "/theory",
            Self::Practice => "/practice",
        }
    }
}

/// Receiver of navigation commands.
///
/// The gesture core never navigates by itself; it hands each accepted
/// gesture's destination to a sink.  Errors are reported back so the
/// dispatcher can log them, but they never stop frame processing.
pub trait NavigationSink {
    fn navigate(&mut self, destination: Destination) -> anyhow::Result<()>;
}

impl<F> NavigationSink for F
where
    F: FnMut(Destination) -> anyhow::Result<()>,
{
    fn navigate(&mut self, destination: Destination) -> anyhow::Result<()> {
        self(destination)
    }
}

/// Sink that records every destination in order.
#[derive(Debug, Default, Clone)]
pub struct RouteLog {
    pub visited: Vec<Destination>,
}

impl RouteLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NavigationSink for RouteLog {
    fn navigate(&mut self, destination: Destination) -> anyhow::Result<()> {
        self.visited.push(destination);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_str_and_route() {
        assert_eq!(Destination::Dashboard.as_str(), "dashboard");
        assert_eq!(Destination::Theory.as_str(), "theory");
        assert_eq!(Destination::Practice.as_str(), "practice");
        assert_eq!(Destination::Dashboard.route(), "/dashboard");
        assert_eq!(Destination::Practice.route(), "/practice");
    }

    #[test]
    fn test_closure_sink() {
        let mut seen = Vec::new();
        {
            let mut sink = |d: Destination| -> anyhow::Result<()> {
                seen.push(d);
                Ok(())
            };
            sink.navigate(Destination::Practice).unwrap();
        }
        assert_eq!(seen, vec![Destination::Practice]);
    }

    #[test]
    fn test_route_log() {
        let mut log = RouteLog::new();
        log.navigate(Destination::Dashboard).unwrap();
        log.navigate(Destination::Theory).unwrap();
        assert_eq!(log.visited, vec![Destination::Dashboard, Destination::Theory]);
    }
}
