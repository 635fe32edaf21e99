mod regression;
