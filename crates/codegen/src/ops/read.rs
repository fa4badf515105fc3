use super::OperationSynthesizer;
use dispatch_data::Fragment;

impl OperationSynthesizer {
    /// Reads the element at a reduced position.
    pub fn read(&self, name: &str) -> Fragment {
        let mut builder = Fragment::builder(name);
        let element = self.element(&mut builder, false);
        let value = self.extract(&element);
        builder.finish(Some(value))
    }
}
