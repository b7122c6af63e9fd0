// Host lifecycle: listener binding and hardware release

use std::time::Duration;

use tokio::net::TcpListener;

use robo_rs::config::Config;
use robo_rs::hardware::{HardwareContext, SimulatedGpio, SimulatedMotorDriver, SimulatedServoDriver, SimulatedSpeech};
use robo_rs::motion::DriveCommand;
use robo_rs::{host, HostError};

#[derive(Clone, Default)]
struct Backends {
    gpio: SimulatedGpio,
    servos: SimulatedServoDriver,
    motors: SimulatedMotorDriver,
}

impl Backends {
    fn context(&self) -> HardwareContext {
        HardwareContext::new(
            Box::new(self.gpio.clone()),
            Box::new(self.servos.clone()),
            Box::new(self.motors.clone()),
            Box::new(SimulatedSpeech::new()),
        )
    }
}

fn local_config(port: u16) -> Config {
    let mut config = Config::default();
    config.server.bind = "127.0.0.1".to_string();
    config.server.port = port;
    config
}

#[tokio::test]
async fn test_busy_port_leaves_hardware_untouched() {
    let occupied = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = occupied.local_addr().unwrap().port();
    let backends = Backends::default();

    let result = host::serve(&local_config(port), || Ok(backends.context()), std::future::pending()).await;

    assert!(matches!(result, Err(HostError::Io(_))));
    assert_eq!(backends.gpio.claimed(), 0);
    assert!(backends.motors.commands().is_empty());
    assert!(backends.servos.writes().is_empty());
}

#[tokio::test]
async fn test_busy_http_port_leaves_hardware_untouched() {
    let occupied = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let mut config = local_config(0);
    config.http.enabled = true;
    config.http.bind = "127.0.0.1".to_string();
    config.http.port = occupied.local_addr().unwrap().port();
    let backends = Backends::default();

    let result = host::serve(&config, || Ok(backends.context()), std::future::pending()).await;

    assert!(result.is_err());
    assert!(backends.motors.commands().is_empty());
}

#[tokio::test]
async fn test_shutdown_signal_releases_hardware() {
    let backends = Backends::default();
    let shutdown = async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok(())
    };

    host::serve(&local_config(0), || Ok(backends.context()), shutdown).await.unwrap();

    assert_eq!(backends.gpio.claimed(), 0);
    assert!(backends.servos.is_released());
    assert_eq!(backends.motors.commands(), vec![DriveCommand::Disable, DriveCommand::Disable]);
}
