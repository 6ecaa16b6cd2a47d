pub use kittynode_protocol::{
    Binding, Command, Container, DeletePackageParams, DiskInfo, EndpointParams, MemoryInfo,
    Package, PackageConfig, PackageParams, PortBinding, ProcessorInfo, StorageInfo, SystemInfo,
    UpdatePackageConfigParams,
};
