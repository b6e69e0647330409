use std::path::{Path, PathBuf};
use std::fmt::{Debug, Formatter, Result as FmtResult};

use hashbrown::HashMap;

use anchored_logstore::RecordStore;

use crate::custom::CustomLogger;
use crate::error::{AlreadyExists, FacilityError};
use crate::facility::{FacilitySnapshot, LogFacility};
use crate::message::Severity;
use crate::options::FacilityOptions;
use crate::remote::RemotePeer;


/// The set of currently-registered facilities, keyed case-insensitively by name.
///
/// A registry is an ordinary owned value: the surrounding service constructs one, injects the
/// store and destination directory, and passes it wherever it is needed. Nothing here is
/// process-global.
///
/// A facility name is registered at most once at a time. Closing a facility removes it from the
/// registry only after its destination files have been successfully produced; a failed close
/// leaves the facility registered so the close may be retried.
pub struct FacilityRegistry<S: RecordStore> {
    store:      S,
    /// Destination log files are produced in this directory.
    directory:  PathBuf,
    facilities: HashMap<String, LogFacility<S>>,
}

impl<S: RecordStore + Clone + Send + 'static> FacilityRegistry<S> {
    #[must_use]
    pub fn new(store: S, directory: &Path) -> Self {
        Self {
            store,
            directory: directory.to_owned(),
            facilities: HashMap::new(),
        }
    }

    /// The number of currently-registered facilities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.facilities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.facilities.is_empty()
    }

    /// Register and start a facility which writes local file targets.
    ///
    /// # Errors
    ///
    /// Returns an `AlreadyExists` error if a facility is already registered under the name
    /// (names compare case-insensitively), and propagates any target-setup failure, in which
    /// case nothing is registered.
    pub fn init(
        &mut self,
        name:    &str,
        options: FacilityOptions,
    ) -> Result<(), FacilityError<S::Error>> {
        self.init_with(name, options, None)
    }

    /// Like [`init`], with a custom-logging collaborator offered every request before standard
    /// writing.
    ///
    /// [`init`]: FacilityRegistry::init
    pub fn init_with(
        &mut self,
        name:    &str,
        options: FacilityOptions,
        custom:  Option<Box<dyn CustomLogger>>,
    ) -> Result<(), FacilityError<S::Error>> {
        let key = self.vacant_key(name)?;

        let facility = LogFacility::open_local(
            self.store.clone(),
            &self.directory,
            name,
            options,
            custom,
        )?;

        self.facilities.insert(key, facility);
        Ok(())
    }

    /// Register and start a facility which forwards every request to a remote counterpart.
    ///
    /// # Errors
    ///
    /// Returns an `AlreadyExists` error if a facility is already registered under the name.
    pub fn init_remote(
        &mut self,
        name:    &str,
        options: FacilityOptions,
        peer:    Box<dyn RemotePeer>,
    ) -> Result<(), FacilityError<S::Error>> {
        let key = self.vacant_key(name)?;

        let facility = LogFacility::open_remote(name, options, peer)?;

        self.facilities.insert(key, facility);
        Ok(())
    }

    fn vacant_key(&self, name: &str) -> Result<String, FacilityError<S::Error>> {
        let key = registry_key(name);

        if self.facilities.contains_key(&key) {
            Err(AlreadyExists::Facility(name.to_owned()).into())
        } else {
            Ok(key)
        }
    }
}

impl<S: RecordStore> FacilityRegistry<S> {
    /// Look up a registered facility by name, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns a `DoesNotExist` error if no facility is registered under the name.
    pub fn facility(&self, name: &str) -> Result<&LogFacility<S>, FacilityError<S::Error>> {
        self.facilities
            .get(&registry_key(name))
            .ok_or_else(|| FacilityError::DoesNotExist(name.to_owned()))
    }

    /// Submit one message to the named facility. Never blocks; filtering and suspension are
    /// applied by the facility itself.
    ///
    /// # Errors
    ///
    /// Returns a `DoesNotExist` error if no facility is registered under the name.
    pub fn log_message(
        &self,
        name:         &str,
        message:      &str,
        description:  Option<&str>,
        message_type: u32,
    ) -> Result<(), FacilityError<S::Error>> {
        self.facility(name)?
            .log_message(message, description, message_type);
        Ok(())
    }

    /// A point-in-time description of the named facility.
    ///
    /// # Errors
    ///
    /// Returns a `DoesNotExist` error if no facility is registered under the name.
    pub fn query(&self, name: &str) -> Result<FacilitySnapshot, FacilityError<S::Error>> {
        self.facility(name).map(LogFacility::query)
    }

    /// Point-in-time descriptions of every registered facility, in no particular order.
    #[must_use]
    pub fn list(&self) -> Vec<FacilitySnapshot> {
        self.facilities.values().map(LogFacility::query).collect()
    }

    /// Suspend the named facility: its messages are discarded until it is resumed.
    ///
    /// # Errors
    ///
    /// Returns a `DoesNotExist` error if no facility is registered under the name.
    pub fn suspend(&self, name: &str) -> Result<(), FacilityError<S::Error>> {
        self.facility(name)?.suspend();
        Ok(())
    }

    /// # Errors
    ///
    /// Returns a `DoesNotExist` error if no facility is registered under the name.
    pub fn resume(&self, name: &str) -> Result<(), FacilityError<S::Error>> {
        self.facility(name)?.resume();
        Ok(())
    }

    pub fn suspend_all(&self) {
        for facility in self.facilities.values() {
            facility.suspend();
        }
    }

    pub fn resume_all(&self) {
        for facility in self.facilities.values() {
            facility.resume();
        }
    }

    /// Change the named facility's severity filter level.
    ///
    /// # Errors
    ///
    /// Returns a `DoesNotExist` error if no facility is registered under the name.
    pub fn set_level(&self, name: &str, level: Severity) -> Result<(), FacilityError<S::Error>> {
        self.facility(name)?.set_level(level);
        Ok(())
    }

    /// Close the named facility: drain its queue, produce its destination files, terminate its
    /// worker thread, and remove it from the registry.
    ///
    /// # Errors
    ///
    /// Returns a `DoesNotExist` error if no facility is registered under the name. A
    /// finalization failure is propagated and the facility is **not** removed, so the close
    /// may be retried.
    pub fn close(&mut self, name: &str, cap_xml: bool) -> Result<(), FacilityError<S::Error>> {
        let key = registry_key(name);

        let facility = self.facilities
            .get_mut(&key)
            .ok_or_else(|| FacilityError::DoesNotExist(name.to_owned()))?;

        facility.close(cap_xml)?;
        self.facilities.remove(&key);
        Ok(())
    }

    /// Close every registered facility.
    ///
    /// # Errors
    ///
    /// Stops at the first facility whose close fails; that facility and any not yet visited
    /// remain registered.
    pub fn close_all(&mut self, cap_xml: bool) -> Result<(), FacilityError<S::Error>> {
        let keys = self.facilities.keys().cloned().collect::<Vec<_>>();

        for key in keys {
            self.close(&key, cap_xml)?;
        }
        Ok(())
    }
}

impl<S: RecordStore> Debug for FacilityRegistry<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("FacilityRegistry")
            .field("directory", &self.directory)
            .field("facilities", &self.facilities.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// Facility names are unique case-insensitively; the registry keys on the lowercased name.
fn registry_key(name: &str) -> String {
    name.to_lowercase()
}
