use std::{error::Error, sync::Arc};

use lithiumate::{BmsDevice, BridgeServer, ParameterId, SimulatedBms};
use tokio::{net::TcpListener, signal};

use super::args::Cli;

pub async fn run(args: Cli) -> Result<(), Box<dyn Error>> {
    let device = Arc::new(ServerImpl {
        bms: SimulatedBms::default(),
    });

    let listener = TcpListener::bind(format!("localhost:{}", args.port)).await?;
    let listener_str = listener.local_addr()?.to_string();

    _ = BridgeServer::run(listener, device, args.request_id);

    println!(
        "Simulated BMS on {:#05X} listening on {}. Press Ctrl-C to stop.",
        args.request_id, listener_str
    );

    signal::ctrl_c().await?;

    Ok(())
}

struct ServerImpl {
    bms: SimulatedBms,
}

impl BmsDevice for ServerImpl {
    fn read_parameter(&self, parameter: ParameterId, pid_lo: u8) -> Option<[u8; 4]> {
        let data = self.bms.read_parameter(parameter, pid_lo);
        let pid_hi: u8 = parameter.into();
        match data {
            Some(data) => println!("Read {parameter:?} ({pid_hi:02X} {pid_lo:02X}): {data:02X?}"),
            None => println!("Read {pid_hi:02X} {pid_lo:02X}: no such parameter"),
        }
        data
    }

    fn clear_stored_fault(&self) -> bool {
        println!("Clear stored fault: was {}", self.bms.state().stored_fault);
        self.bms.clear_stored_fault()
    }
}
