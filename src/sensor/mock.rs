//! Scripted gateway for tests.
//!
//! Clones share state, so a test can keep one handle to steer readings while
//! the tracker owns another.

use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use crate::model::Coordinate;

use super::{Connector, PositionSource, SensorGateway};

#[derive(Debug, Default)]
struct State {
    connected: bool,
    odometer: Option<f64>,
    fuel_level: Option<f64>,
    fuel_rate: Option<f64>,
    scripted_rates: VecDeque<Option<f64>>,
    position: Option<Coordinate>,
    rate_reads: u32,
    disconnect_after_rate_reads: Option<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct MockGateway {
    state: Rc<RefCell<State>>,
}

impl MockGateway {
    /// A connected gateway with no readings.
    pub fn connected() -> Self {
        let gateway = Self::default();
        gateway.state.borrow_mut().connected = true;
        gateway
    }

    /// A connected gateway reporting the given odometer, fuel level, and a fixed position.
    pub fn with_readings(odometer: f64, fuel_level: f64) -> Self {
        let gateway = Self::connected();
        gateway.set_odometer(Some(odometer));
        gateway.set_fuel_level(Some(fuel_level));
        gateway.set_position(Some(Coordinate {
            latitude: 52.52,
            longitude: 13.405,
        }));
        gateway
    }

    pub fn set_odometer(&self, value: Option<f64>) {
        self.state.borrow_mut().odometer = value;
    }

    pub fn set_fuel_level(&self, value: Option<f64>) {
        self.state.borrow_mut().fuel_level = value;
    }

    /// Sets the rate returned once any scripted rates run out.
    pub fn set_fuel_rate(&self, value: Option<f64>) {
        self.state.borrow_mut().fuel_rate = value;
    }

    /// Queues rates returned by successive reads, ahead of the fixed rate.
    pub fn script_fuel_rates(&self, rates: impl IntoIterator<Item = Option<f64>>) {
        self.state.borrow_mut().scripted_rates.extend(rates);
    }

    pub fn set_position(&self, value: Option<Coordinate>) {
        self.state.borrow_mut().position = value;
    }

    /// Drops the connection after `reads` fuel-rate reads.
    pub fn disconnect_after_rate_reads(&self, reads: u32) {
        self.state.borrow_mut().disconnect_after_rate_reads = Some(reads);
    }
}

impl SensorGateway for MockGateway {
    fn is_connected(&self) -> bool {
        self.state.borrow().connected
    }

    fn read_odometer(&mut self) -> Option<f64> {
        let state = self.state.borrow();
        state.connected.then_some(state.odometer).flatten()
    }

    fn read_fuel_level(&mut self) -> Option<f64> {
        let state = self.state.borrow();
        state.connected.then_some(state.fuel_level).flatten()
    }

    fn read_fuel_rate(&mut self) -> Option<f64> {
        let mut state = self.state.borrow_mut();
        if !state.connected {
            return None;
        }
        state.rate_reads += 1;
        let rate = match state.scripted_rates.pop_front() {
            Some(scripted) => scripted,
            None => state.fuel_rate,
        };
        if state.disconnect_after_rate_reads == Some(state.rate_reads) {
            state.connected = false;
        }
        rate
    }
}

impl PositionSource for MockGateway {
    fn read_position(&mut self) -> Option<Coordinate> {
        let state = self.state.borrow();
        state.connected.then_some(state.position).flatten()
    }
}

/// Connects after a given number of failed attempts.
#[derive(Debug)]
pub struct MockConnector {
    pub gateway: MockGateway,
    pub failures_before_connect: Option<u32>,
    pub attempts: u32,
}

impl MockConnector {
    pub fn succeeding_after(failures: u32, gateway: MockGateway) -> Self {
        Self {
            gateway,
            failures_before_connect: Some(failures),
            attempts: 0,
        }
    }

    pub fn never(gateway: MockGateway) -> Self {
        Self {
            gateway,
            failures_before_connect: None,
            attempts: 0,
        }
    }
}

impl Connector for MockConnector {
    type Gateway = MockGateway;

    fn connect(&mut self) -> Option<MockGateway> {
        self.attempts += 1;
        match self.failures_before_connect {
            Some(n) if self.attempts > n => Some(self.gateway.clone()),
            _ => None,
        }
    }
}
