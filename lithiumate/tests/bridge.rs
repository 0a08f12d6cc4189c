use std::sync::Arc;

use lithiumate::{
    BmsClient, BmsConfig, BmsDevice, BmsError, BridgeServer, BridgeTransport, FaultKind, LimitCause, ParameterId, SimulatedBms, SimulatedState,
    StoredFaultKind,
};
use tokio::net::{TcpListener, TcpStream};

async fn serve<D: BmsDevice>(device: Arc<D>) -> BmsClient<BridgeTransport> {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    _ = BridgeServer::run(listener, device, 0x0745);

    let stream = TcpStream::connect(addr).await.unwrap();
    let (transport, _) = BridgeTransport::connect(stream);
    BmsClient::new(transport, BmsConfig::default())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
pub async fn quantities_over_bridge() {
    let device = Arc::new(SimulatedBms::new(SimulatedState {
        state_of_charge: 77,
        pack_volts: 50.0,
        charge_limit: 50,
        charge_limit_cause: LimitCause::CellVoltageTooHigh,
        present_faults: FaultKind::OverTemperature.into(),
        stored_fault: StoredFaultKind::OverTemperature,
        ..Default::default()
    }));
    let mut client = serve(device.clone()).await;

    tokio::task::block_in_place(|| {
        assert!(client.init());
        assert_eq!(client.state_of_charge(), 77);
        assert!((client.pack_voltage() - 50.0).abs() < 1e-4);

        let limit = client.charge_limit();
        assert_eq!(limit.percent, 50);
        assert_eq!(limit.cause, LimitCause::CellVoltageTooHigh);

        let faults = client.faults();
        assert!(faults.present.contains(FaultKind::OverTemperature));
        assert_eq!(faults.stored, StoredFaultKind::OverTemperature);

        assert_eq!(client.clear_stored_fault(), Ok(()));
        assert_eq!(client.faults().stored, StoredFaultKind::None);
    });

    assert_eq!(device.state().stored_fault, StoredFaultKind::None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
pub async fn unknown_parameter_times_out() {
    let mut client = serve(Arc::new(SimulatedBms::default())).await;

    tokio::task::block_in_place(|| {
        assert!(client.init());
        assert_eq!(client.read(ParameterId::Unknown(0x7E)), Err(BmsError::Timeout(100)));
        // the bridge is still usable afterwards
        assert_eq!(client.state_of_charge(), 80);
    });
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
pub async fn wrong_request_id_yields_fallbacks() {
    let mut client = serve(Arc::new(SimulatedBms::default())).await;
    client.set_request_id(0x0620);

    tokio::task::block_in_place(|| {
        assert!(client.init());
        assert_eq!(client.state_of_charge(), 0);
        assert!(client.faults().present.contains(FaultKind::CantFindBmsOnCanBus));
    });
}
