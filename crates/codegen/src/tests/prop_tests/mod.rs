mod table_ops;
