use anyhow::{Context as _, Error, Result};
use base_odometry::config::{ODOM_TOPIC, POSE_TOPIC, QUEUE_DEPTH, TF_TOPIC, VELOCITY_TOPIC};
use base_odometry::{
    AbsolutePoseInput, EstimatorConfig, OdometrySample, OdometryStack, Timestamp,
    TransformSample, VelocityInput,
};
use log::{debug, error, info, warn};
use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use rclrs::{
    Context, CreateBasicExecutor, Node, QoSHistoryPolicy, QoSProfile, RclrsErrorFilter,
    SpinOptions, QOS_PROFILE_DEFAULT,
};
use std::sync::{Arc, Mutex, Weak};

use builtin_interfaces::msg::Time;
use geometry_msgs::msg::{PoseStamped, Twist};
use nav_msgs::msg::Odometry;
use std_msgs::msg::Header;
use tf2_msgs::msg::TFMessage;

struct OdometryNode {
    stack: OdometryStack,
    node: Arc<Node>,
    odom_publisher: Arc<rclrs::Publisher<Odometry>>,
    tf_publisher: Option<Arc<rclrs::Publisher<TFMessage>>>,
    velocity_subscription: Mutex<Option<Arc<rclrs::Subscription<Twist>>>>,
    pose_subscription: Mutex<Option<Arc<rclrs::Subscription<PoseStamped>>>>,
}

impl OdometryNode {
    pub fn new(executor: &rclrs::Executor, name: &str) -> Result<Arc<Self>> {
        let node = executor.create_node(name)?;

        let config = read_config(&node)?;
        info!(
            "Using parameters: linear_scale={}, enable_pose_input={}, publish_transform={}",
            config.linear_scale, config.enable_pose_input, config.publish_transform
        );
        info!(
            "Topics: velocity={}, pose={}, odom={}, tf={}",
            VELOCITY_TOPIC, POSE_TOPIC, ODOM_TOPIC, TF_TOPIC
        );

        let mut stack = OdometryStack::new(config.clone());
        stack.init().context("failed to initialize odometry stack")?;

        let qos = queue_qos();
        let odom_publisher = node.create_publisher::<Odometry>(ODOM_TOPIC, qos)?;
        let tf_publisher = if config.publish_transform {
            Some(node.create_publisher::<TFMessage>(TF_TOPIC, qos)?)
        } else {
            None
        };

        let odometry_node = Arc::new(OdometryNode {
            stack,
            node,
            odom_publisher,
            tf_publisher,
            velocity_subscription: None.into(),
            pose_subscription: None.into(),
        });

        // Callbacks hold the node weakly so dropping it runs the stack shutdown
        let velocity_subscription = odometry_node.node.create_subscription::<Twist, _>(
            VELOCITY_TOPIC,
            qos,
            weak_callback(&odometry_node, OdometryNode::velocity_callback),
        )?;
        *lock(&odometry_node.velocity_subscription) = Some(velocity_subscription);

        if config.enable_pose_input {
            let pose_subscription = odometry_node.node.create_subscription::<PoseStamped, _>(
                POSE_TOPIC,
                qos,
                weak_callback(&odometry_node, OdometryNode::pose_callback),
            )?;
            *lock(&odometry_node.pose_subscription) = Some(pose_subscription);
        }

        Ok(odometry_node)
    }

    fn now(&self) -> Timestamp {
        Timestamp::from_nanos(self.node.get_clock().now().nsec)
    }

    fn velocity_callback(&self, msg: Twist) {
        let velocity = VelocityInput::new(msg.linear.x, msg.linear.y, msg.angular.z);
        match self.stack.handle_velocity(velocity, self.now()) {
            Ok(sample) => self.publish(&sample),
            Err(e) => warn!("Dropping velocity sample: {}", e),
        }
    }

    fn pose_callback(&self, msg: PoseStamped) {
        let position = &msg.pose.position;
        let orientation = &msg.pose.orientation;
        let pose = AbsolutePoseInput::new(
            Vector3::new(position.x, position.y, position.z),
            UnitQuaternion::from_quaternion(Quaternion::new(
                orientation.w,
                orientation.x,
                orientation.y,
                orientation.z,
            )),
        );
        match self.stack.handle_pose(pose, self.now()) {
            Ok(sample) => self.publish(&sample),
            Err(e) => warn!("Dropping absolute pose: {}", e),
        }
    }

    fn publish(&self, sample: &OdometrySample) {
        if let Err(e) = self.odom_publisher.publish(&odometry_msg(sample)) {
            error!("Failed to publish odometry: {}", e);
        } else {
            debug!(
                "Published odometry: x={:.3}, y={:.3}",
                sample.position.x, sample.position.y
            );
        }

        if let Some(tf_publisher) = &self.tf_publisher {
            let tf = TFMessage {
                transforms: vec![transform_msg(&sample.to_transform())],
            };
            if let Err(e) = tf_publisher.publish(&tf) {
                error!("Failed to publish transform: {}", e);
            }
        }
    }
}

impl Drop for OdometryNode {
    fn drop(&mut self) {
        if let Err(e) = self.stack.shutdown() {
            warn!("Odometry stack did not shut down cleanly: {}", e);
        }
    }
}

/// Default QoS with the history deep enough for bursts from the base controller
fn queue_qos() -> QoSProfile {
    QoSProfile {
        history: QoSHistoryPolicy::KeepLast {
            depth: QUEUE_DEPTH as u32,
        },
        ..QOS_PROFILE_DEFAULT
    }
}

/// Forward messages to `handler` for as long as `target` is alive
fn weak_callback<T, M>(
    target: &Arc<T>,
    handler: fn(&T, M),
) -> impl Fn(M) + Send + Sync + 'static
where
    T: Send + Sync + 'static,
    M: 'static,
{
    let target: Weak<T> = Arc::downgrade(target);
    move |msg: M| {
        if let Some(target) = target.upgrade() {
            handler(&target, msg);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

fn read_config(node: &Node) -> Result<EstimatorConfig> {
    let defaults = EstimatorConfig::default();
    let config = EstimatorConfig {
        linear_scale: node
            .declare_parameter("linear_scale")
            .default(defaults.linear_scale)
            .mandatory()?
            .get(),
        enable_pose_input: node
            .declare_parameter("enable_pose_input")
            .default(defaults.enable_pose_input)
            .mandatory()?
            .get(),
        publish_transform: node
            .declare_parameter("publish_transform")
            .default(defaults.publish_transform)
            .mandatory()?
            .get(),
        seed_clock_on_first_sample: node
            .declare_parameter("seed_clock_on_first_sample")
            .default(defaults.seed_clock_on_first_sample)
            .mandatory()?
            .get(),
        sync_heading_on_override: node
            .declare_parameter("sync_heading_on_override")
            .default(defaults.sync_heading_on_override)
            .mandatory()?
            .get(),
    };
    config.validate()?;
    Ok(config)
}

fn header(stamp: Timestamp, frame_id: &str) -> Header {
    let (sec, nanosec) = stamp.to_sec_nanosec();
    Header {
        stamp: Time { sec, nanosec },
        frame_id: frame_id.to_string(),
    }
}

fn quaternion_msg(rotation: &UnitQuaternion<f64>) -> geometry_msgs::msg::Quaternion {
    geometry_msgs::msg::Quaternion {
        x: rotation.i,
        y: rotation.j,
        z: rotation.k,
        w: rotation.w,
    }
}

fn odometry_msg(sample: &OdometrySample) -> Odometry {
    let mut odom = Odometry::default();
    odom.header = header(sample.stamp, &sample.frame_id);
    odom.child_frame_id = sample.child_frame_id.clone();

    odom.pose.pose.position.x = sample.position.x;
    odom.pose.pose.position.y = sample.position.y;
    odom.pose.pose.position.z = sample.position.z;
    odom.pose.pose.orientation = quaternion_msg(&sample.orientation);
    odom.pose.covariance = sample.pose_covariance;

    odom.twist.twist.linear.x = sample.twist.linear_x;
    odom.twist.twist.linear.y = sample.twist.linear_y;
    odom.twist.twist.angular.z = sample.twist.angular_z;
    odom.twist.covariance = sample.twist_covariance;
    odom
}

fn transform_msg(transform: &TransformSample) -> geometry_msgs::msg::TransformStamped {
    let mut msg = geometry_msgs::msg::TransformStamped::default();
    msg.header = header(transform.stamp, &transform.frame_id);
    msg.child_frame_id = transform.child_frame_id.clone();
    msg.transform.translation.x = transform.translation.x;
    msg.transform.translation.y = transform.translation.y;
    msg.transform.translation.z = transform.translation.z;
    msg.transform.rotation = quaternion_msg(&transform.rotation);
    msg
}

fn main() -> Result<(), Error> {
    env_logger::init();
    info!("Initializing base odometry node...");

    let mut executor = Context::default_from_env()?.create_basic_executor();

    let _odometry_node = OdometryNode::new(&executor, "base_odometry_node")?;

    info!("Base odometry node initialized. Starting to spin...");

    executor
        .spin(SpinOptions::default())
        .first_error()
        .map_err(|err| err.into())
}
