mod pipeline;

pub use pipeline::{
    fetch_record, locate_record, update_ipv6_record, validate_address, RecordTarget,
};
