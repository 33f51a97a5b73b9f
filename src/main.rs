use posturebot::{
    AppError, Configuration, PostureSessionBuilder, SimulatedEstimator, SyntheticVideoSource,
};
use std::sync::Arc;
use tracing::{info, Level};

fn init_logging() {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    init_logging();

    let config_path = std::env::args().nth(1);
    let configuration = Configuration::load(config_path.as_deref())?;

    // Demo wiring: synthetic camera + simulated pose model.
    let video = Arc::new(SyntheticVideoSource::new(
        configuration.frame_width,
        configuration.frame_height,
    ));
    let estimator = Arc::new(SimulatedEstimator::new(configuration.estimator.clone()));

    let session = PostureSessionBuilder::new(configuration)
        .video_source(video)
        .estimator(estimator)
        .build()?;

    info!("Posture session started, press Ctrl-C to stop");
    let mut rx = session.subscribe();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let assessment = rx.borrow_and_update().clone();
                info!(
                    "confidence {:.0}% tilt {:+.1} deg warnings {:?}",
                    assessment.confidence,
                    assessment.head_tilt_angle,
                    assessment.messages()
                );
            }
        }
    }

    session.stop();
    Ok(())
}
