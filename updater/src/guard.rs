// Hardware partition guard

use crate::device::BlockDevice;
use crate::error::{Result, UpdateError};

/// Run `body` with `target` selected as the device's hardware partition.
///
/// The currently active partition is saved first. If it already equals
/// `target` no switch happens at all. Otherwise the device is switched,
/// `body` runs, and the saved partition is switched back in regardless of
/// how `body` finished.
///
/// A failed initial switch is reported as [`UpdateError::PartitionSwitch`]
/// and `body` is not run. A failed restore after a successful `body` is
/// reported as [`UpdateError::PartitionRestore`]; after a failed `body` the
/// body's error wins and the restore failure is only logged.
pub fn with_partition<D, T, F>(device: &mut D, target: u32, body: F) -> Result<T>
where
    D: BlockDevice + ?Sized,
    F: FnOnce(&mut D) -> Result<T>,
{
    let saved = device.active_partition();
    if saved == target {
        return body(device);
    }

    if let Err(source) = device.switch_partition(target) {
        tracing::error!(from = saved, to = target, error = %source, "cannot switch to hwpart");
        return Err(UpdateError::PartitionSwitch {
            partition: target,
            source,
        });
    }

    let result = body(device);

    match device.switch_partition(saved) {
        Ok(()) => result,
        Err(source) => {
            tracing::error!(from = target, to = saved, error = %source, "cannot restore hwpart");
            match result {
                Ok(_) => Err(UpdateError::PartitionRestore {
                    partition: saved,
                    source,
                }),
                Err(err) => Err(err),
            }
        }
    }
}
