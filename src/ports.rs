//! Well-known ports probed by the resolver.

/// HTTPS on the coordinator-fleet and public broker load balancers
pub const HTTPS: u16 = 443;

/// HTTPS management on coordinator services and the fleet's regional API
pub const SECURE_MANAGEMENT: u16 = 8443;

pub const SSH: u16 = 22;

pub const POSTGRES: u16 = 5432;

/// Log-collector ingest (beats/logstash input)
pub const LOG_INGEST: u16 = 4560;

/// Log-collector API used by coordinators
pub const LOG_API: u16 = 8881;

/// Log-collector web front end used by browsers
pub const LOG_WEB: u16 = 8882;

/// AMQP over TLS on the broker load balancers
pub const SECURE_AMQP: u16 = 5671;

/// Broker client traffic (AMQP-style) between broker nodes
pub const BROKER_AMQP: u16 = 7789;

/// Broker clustering link between broker nodes
pub const BROKER_CLUSTERING: u16 = 7788;

/// Broker peer discovery (epmd)
pub const BROKER_PEER_DISCOVERY: u16 = 4369;

/// Broker inter-node distribution
pub const BROKER_DISTRIBUTION: u16 = 25672;

/// Coordinator-service cluster membership
pub const SERVICE_MEMBERSHIP: u16 = 5701;

/// Coordinator-service data store
pub const SERVICE_DATA_STORE: u16 = 27017;

/// Ports probed on a broker load balancer by a broker node, in probe order
pub const BROKER_LINK: [u16; 2] = [BROKER_AMQP, BROKER_CLUSTERING];

/// Ports probed on every broker-cluster member, in probe order
pub const BROKER_MEMBER: [u16; 5] = [
    BROKER_AMQP,
    BROKER_CLUSTERING,
    BROKER_PEER_DISCOVERY,
    BROKER_DISTRIBUTION,
    SSH,
];

/// Ports probed on every coordinator-service member, in probe order
pub const SERVICE_MEMBER: [u16; 4] = [
    SSH,
    SERVICE_MEMBERSHIP,
    SERVICE_DATA_STORE,
    SECURE_MANAGEMENT,
];

/// Ports probed on each region's public broker endpoint by a worker
pub const WORKER_BROKER: [u16; 2] = [SECURE_AMQP, BROKER_AMQP];
