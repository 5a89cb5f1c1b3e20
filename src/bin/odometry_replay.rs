use anyhow::Result;
use base_odometry::estimation::task::EstimatorTask;
use base_odometry::{
    AbsolutePoseInput, EstimatorConfig, OdometryStack, PoseEstimator, Timestamp, VelocityInput,
};
use log::info;
use nalgebra::{UnitQuaternion, Vector3};
use std::collections::HashMap;
use std::f64::consts::FRAC_PI_2;

/// Drive forward, turn left, drive forward again
fn velocity_script() -> Vec<(f64, VelocityInput)> {
    let mut script = Vec::new();
    for step in 1..=10 {
        script.push((step as f64 * 0.1, VelocityInput::new(0.5, 0.0, 0.0)));
    }
    for step in 11..=20 {
        script.push((step as f64 * 0.1, VelocityInput::new(0.0, 0.0, FRAC_PI_2)));
    }
    for step in 21..=30 {
        script.push((step as f64 * 0.1, VelocityInput::new(0.5, 0.0, 0.0)));
    }
    script
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("Initializing odometry replay...");

    let mut params = HashMap::new();
    params.insert("linear_scale".to_string(), 1.0);
    params.insert("seed_clock_on_first_sample".to_string(), 1.0);
    params.insert("publish_transform".to_string(), 1.0);

    let mut config = EstimatorConfig::default();
    config.configure(&params)?;

    let mut stack = OdometryStack::new(config.clone());
    stack.init()?;
    info!("Odometry stack initialized");

    for (secs, velocity) in velocity_script() {
        let sample = stack.handle_velocity(velocity, Timestamp::from_secs_f64(secs))?;
        info!(
            "t={:.1}s position=({:.3}, {:.3}) twist=({:.2}, {:.2})",
            secs,
            sample.position.x,
            sample.position.y,
            sample.twist.linear_x,
            sample.twist.angular_z
        );
    }
    let pose = stack.estimator().pose();
    info!(
        "Final pose: x={:.3}, y={:.3}, heading={:.3}",
        pose.x,
        pose.y,
        pose.normalized_heading()
    );
    stack.shutdown()?;

    // Same script through the single-consumer task, with a localizer fix at the end
    let (handle, mut output, join) = EstimatorTask::spawn(PoseEstimator::new(config), 64);
    let producer = tokio::spawn(async move {
        for (secs, velocity) in velocity_script() {
            handle
                .send_velocity(velocity, Timestamp::from_secs_f64(secs))
                .await?;
        }
        handle
            .send_pose(
                AbsolutePoseInput::new(Vector3::new(0.5, 0.5, 0.0), UnitQuaternion::identity()),
                Timestamp::from_secs_f64(3.1),
            )
            .await
    });

    let mut emitted = 0;
    while let Some(emission) = output.recv().await {
        emitted += 1;
        if let Some(transform) = emission.transform {
            info!(
                "tf {} -> {}: ({:.3}, {:.3})",
                transform.frame_id,
                transform.child_frame_id,
                transform.translation.x,
                transform.translation.y
            );
        }
    }
    producer.await??;
    let estimator = join.await?;
    info!(
        "Task emitted {} samples, final position ({:.3}, {:.3})",
        emitted,
        estimator.pose().x,
        estimator.pose().y
    );

    Ok(())
}
