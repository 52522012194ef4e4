use crate::topology::Topology;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::{error, info, warn};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Parse a topology from a YAML reader
///
/// Missing keys default to empty and unknown keys are ignored. An empty
/// document yields an empty topology.
pub fn load_topology_from_reader<R: Read>(mut reader: R) -> Result<Topology> {
    let mut content = String::new();
    reader
        .read_to_string(&mut content)
        .wrap_err("Failed to read topology")?;

    if content.trim().is_empty() {
        warn!("Topology document is empty");
        return Ok(Topology::default());
    }

    let topology: Topology =
        serde_yaml::from_str(&content).wrap_err("Failed to decode topology YAML")?;

    if let Err(e) = topology.validate() {
        warn!("Topology violates a uniqueness invariant, first match wins: {}", e);
    }

    Ok(topology)
}

/// Load a topology from a YAML file.
///
/// Only a file that cannot be opened is an error; its content is decoded
/// with the same fallback as [`read_topology_or_default`].
pub fn load_topology(path: &Path) -> Result<Topology> {
    info!("Loading topology from: {:?}", path);

    let file = File::open(path)
        .wrap_err_with(|| format!("Failed to open topology file '{}'", path.display()))?;

    Ok(read_topology_or_default(file))
}

/// Read a topology, falling back to an empty one if it cannot be decoded.
///
/// A bad document must not stop the run: the verification then proceeds
/// with whatever checks an empty topology implies.
pub fn read_topology_or_default<R: Read>(reader: R) -> Topology {
    info!("reading topology...");
    let topology = match load_topology_from_reader(reader) {
        Ok(topology) => topology,
        Err(e) => {
            error!("error decoding topology: {:#}", e);
            Topology::default()
        }
    };
    info!("reading topology...done");
    topology
}

/// Write the topology back out as YAML
pub fn dump_topology<W: Write>(topology: &Topology, writer: W) -> Result<()> {
    info!("writing topology...");
    serde_yaml::to_writer(writer, topology).wrap_err("Failed to encode topology YAML")?;
    info!("writing topology...done");
    Ok(())
}
